pub(crate) mod buffer;
pub(crate) mod dsp;
pub(crate) mod mix;
pub(crate) mod prepare;
