//! 有理数类型, 用于表示时间基 (time_base).

use std::fmt;

/// 有理数, 由分子和分母组成
///
/// 音频流的时间基通常是 1/采样率.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 判断是否有效 (分母不为 0)
    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 转换为 f64 浮点数, 分母为 0 时返回 NaN
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_时间基_换算() {
        let tb = Rational::new(1, 48000);
        assert!(tb.is_valid());
        assert!((tb.to_f64() * 48000.0 - 1.0).abs() < 1e-12);
        assert!(Rational::UNDEFINED.to_f64().is_nan());
    }
}
