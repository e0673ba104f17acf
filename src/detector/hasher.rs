//! # 内容摘要模块
//!
//! 对像素原始字节做 SHA-256，作为“两张图是否完全一致”的快速判定。
//! 摘要只编码内容不编码形状，调用方必须先比较形状再比较摘要。

use sha2::{Digest, Sha256};
use std::fmt;

use super::array::{GrayArray, NativeImage};

/// 像素内容摘要（SHA-256，32 字节）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDigest([u8; 32]);

impl ImageDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 对行优先展开后的原始样本求摘要。
pub fn digest(raw_bytes: &[u8]) -> ImageDigest {
    let mut hasher = Sha256::new();
    hasher.update(raw_bytes);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    ImageDigest(bytes)
}

pub fn digest_native(image: &NativeImage) -> ImageDigest {
    digest(image.as_bytes())
}

pub fn digest_gray(array: &GrayArray) -> ImageDigest {
    digest(array.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_order_sensitive() {
        assert_eq!(digest(&[1, 2, 3]), digest(&[1, 2, 3]));
        assert_ne!(digest(&[1, 2, 3]), digest(&[3, 2, 1]));
    }

    #[test]
    fn known_sha256_vector() {
        assert_eq!(
            digest(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn transposed_zero_arrays_share_a_digest() {
        // 摘要本身无法区分 10x20 与 20x10，形状比较必须由调用方完成
        let tall = GrayArray::filled(20, 10, 0);
        let wide = GrayArray::filled(10, 20, 0);
        assert_eq!(digest_gray(&tall), digest_gray(&wide));
        assert_ne!(tall.shape(), wide.shape());
    }
}
