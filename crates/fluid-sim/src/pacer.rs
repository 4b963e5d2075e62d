//! Keeping the simulation to a steady frame rate.

/// When the simulation falls behind, only every nth frame still gets drawn.
const DRAW_EVERY_NTH_FRAME_WHEN_BEHIND: u64 = 4;

/// Paces frames to a target frame rate.
///
/// The physics always runs every frame. When the simulation can't keep up, drawing is what gets
/// dropped, so that the fluid still moves at the right speed.
#[derive(Debug)]
pub struct FramePacer {
    /// How long a single frame should take
    frame_duration: std::time::Duration,
    /// When the next frame is due
    next_tick: tokio::time::Instant,
    /// Headless runs go as fast as they can and draw every frame
    is_realtime: bool,
    /// How many frames started late
    overruns: u64,
}

impl FramePacer {
    /// Instantiate
    #[must_use]
    pub fn new(frame_rate: u32, is_realtime: bool) -> Self {
        let frame_duration = std::time::Duration::from_secs(1)
            .checked_div(frame_rate.max(1))
            .unwrap_or_default();

        Self {
            frame_duration,
            next_tick: tokio::time::Instant::now(),
            is_realtime,
            overruns: 0,
        }
    }

    /// Wait until the next frame is due. Returns whether that next frame should be drawn.
    pub async fn end_frame(&mut self, frame: u64) -> bool {
        if !self.is_realtime {
            return true;
        }

        self.next_tick += self.frame_duration;
        if tokio::time::Instant::now() < self.next_tick {
            tokio::time::sleep_until(self.next_tick).await;
            return true;
        }

        self.overruns += 1;
        tracing::trace!("Frame {frame} overran its budget of {:?}", self.frame_duration);
        frame % DRAW_EVERY_NTH_FRAME_WHEN_BEHIND == 0
    }

    /// How many frames overran their time budget.
    #[must_use]
    pub const fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn headless_never_waits_or_skips() {
        let mut pacer = FramePacer::new(60, false);
        let start = tokio::time::Instant::now();
        for frame in 1..=10 {
            assert!(pacer.end_frame(frame).await);
        }
        assert_eq!(start.elapsed(), std::time::Duration::ZERO);
        assert_eq!(pacer.overruns(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn realtime_waits_for_each_frame() {
        let mut pacer = FramePacer::new(50, true);
        let start = tokio::time::Instant::now();
        for frame in 1..=5 {
            assert!(pacer.end_frame(frame).await);
        }
        assert_eq!(start.elapsed(), std::time::Duration::from_millis(100));
        assert_eq!(pacer.overruns(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_drawing_when_behind() {
        let mut pacer = FramePacer::new(50, true);
        tokio::time::advance(std::time::Duration::from_secs(1)).await;

        assert!(!pacer.end_frame(1).await);
        assert!(!pacer.end_frame(2).await);
        assert!(!pacer.end_frame(3).await);
        assert!(pacer.end_frame(4).await);
        assert_eq!(pacer.overruns(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn no_time_to_spare_is_behind() {
        let mut pacer = FramePacer::new(50, true);
        tokio::time::advance(std::time::Duration::from_millis(20)).await;

        assert!(!pacer.end_frame(1).await);
        assert_eq!(pacer.overruns(), 1);
    }
}
