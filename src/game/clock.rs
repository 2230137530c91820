use chess::Color;

/// Result of advancing the clock by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No timer is running.
    Idle,
    /// The running side still has time left.
    Running(Color),
    /// The running side reached zero and has been stopped.
    Flagged(Color),
}

/// Two countdown timers in whole seconds; at most one runs at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    white: u64,
    black: u64,
    allotment: u64,
    running: Option<Color>,
}

impl Clock {
    pub fn new(allotment: u64) -> Self {
        Clock {
            white: allotment,
            black: allotment,
            allotment,
            running: None,
        }
    }

    pub fn remaining(&self, color: Color) -> u64 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn running(&self) -> Option<Color> {
        self.running
    }

    fn slot(&mut self, color: Color) -> &mut u64 {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Start (or switch) ticking for `color`. A flagged side never restarts.
    pub fn start(&mut self, color: Color) {
        if self.remaining(color) > 0 {
            self.running = Some(color);
        }
    }

    pub fn stop(&mut self) {
        self.running = None;
    }

    /// Hand the clock over to the opponent of `mover`.
    pub fn switch_after_move(&mut self, mover: Color) {
        self.start(!mover);
    }

    /// Advance the running timer by one second.
    pub fn tick(&mut self) -> Tick {
        let Some(color) = self.running else {
            return Tick::Idle;
        };
        let slot = self.slot(color);
        *slot = slot.saturating_sub(1);
        if *slot == 0 {
            self.running = None;
            Tick::Flagged(color)
        } else {
            Tick::Running(color)
        }
    }

    /// Back to the full allotment with nothing running.
    pub fn reset(&mut self) {
        *self = Clock::new(self.allotment);
    }
}
