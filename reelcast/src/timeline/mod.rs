pub(crate) mod builder;
pub(crate) mod caption_layout;
