/// Rolling indicator over a close-price sequence. The output is aligned to the
/// tail of the input: its last element describes the last close.
pub trait Indicator {
    fn calculate(&self, closes: &[f64]) -> Vec<f64>;

    /// Value at the most recent close, if the input is long enough.
    fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.calculate(closes).last().copied()
    }
}

/// Relative Strength Index over a trailing simple mean of gains and losses.
pub struct RSI {
    pub period: usize,
}

impl RSI {
    pub fn new(period: usize) -> Self {
        RSI { period }
    }

    /// RSI from mean gain and mean loss. A zero mean loss means no down moves
    /// in the window; RSI is pinned to 100 there instead of dividing by zero.
    pub fn from_means(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

impl Indicator for RSI {
    fn calculate(&self, closes: &[f64]) -> Vec<f64> {
        if self.period == 0 || closes.len() < self.period + 1 {
            return vec![];
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = closes
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                if change > 0.0 {
                    (change, 0.0)
                } else {
                    (0.0, -change)
                }
            })
            .unzip();

        (self.period..=gains.len())
            .map(|end| {
                let start = end - self.period;
                let avg_gain = gains[start..end].iter().sum::<f64>() / self.period as f64;
                let avg_loss = losses[start..end].iter().sum::<f64>() / self.period as f64;
                RSI::from_means(avg_gain, avg_loss)
            })
            .collect()
    }
}

/// Percentage change between the last close and the close `window - 1` bars
/// before it, so a window of 20 spans 20 observations.
pub struct RateOfChange {
    pub window: usize,
}

impl RateOfChange {
    pub fn new(window: usize) -> Self {
        RateOfChange { window }
    }
}

impl Indicator for RateOfChange {
    fn calculate(&self, closes: &[f64]) -> Vec<f64> {
        if self.window == 0 || closes.len() < self.window {
            return vec![];
        }
        closes
            .windows(self.window)
            .map(|w| {
                let base = w[0];
                let last = w[w.len() - 1];
                (last - base) / base * 100.0
            })
            .collect()
    }
}

/// Ratio of the symbol's growth factor to the benchmark's over the same window.
/// `None` when either series is too short for the window.
pub fn relative_strength(closes: &[f64], index_closes: &[f64], window: usize) -> Option<f64> {
    let growth = |series: &[f64]| -> Option<f64> {
        if window == 0 || series.len() < window {
            return None;
        }
        let base = series[series.len() - window];
        let last = *series.last()?;
        Some(last / base)
    };
    Some(growth(closes)? / growth(index_closes)?)
}

/// True when the last close is the highest close of the series. Ties count.
pub fn is_breakout(closes: &[f64]) -> bool {
    match closes.last() {
        Some(&last) => closes.iter().all(|&c| last >= c),
        None => false,
    }
}

/// Arithmetic mean of the last `window` values.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}
