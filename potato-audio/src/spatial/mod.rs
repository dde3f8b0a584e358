// Spatial audio module
//
// The positional-audio primitive: distance attenuation plus equal-power
// stereo panning, evaluated once per render block for every spatial sound.

mod panner;

pub use panner::{Panning, SpatialParams, spatial_panning};
