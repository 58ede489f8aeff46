use std::time::Duration;

/// 固定延遲，讓外部服務有時間處理下一個請求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
