use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;

/// バンド生成で使う乱数源
/// テストではシード付きの乱数や固定値を注入して結果を再現させる
pub trait IRandom {
    /// [0, 1) の一様乱数
    fn next_float(&mut self) -> f64;

    /// [0, upper) の一様な整数
    /// upper が 0 のときは 0 を返す
    fn next_index(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }

        // 浮動小数の誤差で upper ちょうどになるのを防ぐ
        let index = (self.next_float() * upper as f64) as usize;
        index.min(upper - 1)
    }

    /// [min, max] の一様な整数
    fn next_in_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + self.next_index(max - min + 1)
    }
}

impl IRandom for StdRng {
    fn next_float(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl IRandom for ThreadRng {
    fn next_float(&mut self) -> f64 {
        self.gen::<f64>()
    }
}
