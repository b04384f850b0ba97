pub mod error;

pub mod colorimetry {
    pub mod engine;
    pub mod error;
    pub mod observer;
    pub mod spectrum;
    pub mod system;
}

pub mod sun {
    pub mod daylight;
    pub mod schedule;
}

pub mod light {
    pub mod sink;
    pub mod state;
}
