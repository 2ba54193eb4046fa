pub(crate) mod composite;
pub(crate) mod grade;
pub(crate) mod transitions;
pub(crate) mod vfx;
