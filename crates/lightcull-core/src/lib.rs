pub mod error;
pub mod consts;
pub mod frame;
pub mod io;
pub mod stats;
pub mod detect;
pub mod psf;
pub mod snr;
pub mod trails;
pub mod model;
pub mod selection;
pub mod report;
pub mod actions;
pub mod bortle;
pub mod analysis;
