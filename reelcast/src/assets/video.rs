use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::assets::decode::premultiply_rgba8_in_place;
use crate::assets::media::{VideoSourceInfo, decode_video_frame_rgba8};
use crate::assets::store::PreparedImage;
use crate::foundation::error::ReelResult;

/// Environment override for how many decoded frames each video keeps.
pub const VIDEO_CACHE_CAPACITY_ENV: &str = "REELCAST_VIDEO_CACHE_CAPACITY";
const DEFAULT_CAPACITY: usize = 64;

/// Decodes frames of one looping video on demand and keeps the most recent ones.
pub(crate) struct VideoFrameCache {
    info: Arc<VideoSourceInfo>,
    frames: HashMap<u64, PreparedImage>,
    lru: VecDeque<u64>,
    capacity: usize,
}

impl VideoFrameCache {
    pub(crate) fn new(info: Arc<VideoSourceInfo>) -> Self {
        let capacity = std::env::var(VIDEO_CACHE_CAPACITY_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CAPACITY);
        Self::with_capacity(info, capacity)
    }

    pub(crate) fn with_capacity(info: Arc<VideoSourceInfo>, capacity: usize) -> Self {
        Self {
            info,
            frames: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Frame at `t`, wrapped into the source duration when it is known.
    pub(crate) fn frame_at(&mut self, t: f64) -> ReelResult<PreparedImage> {
        let key = self.key_for_time(t);
        if let Some(img) = self.frames.get(&key).cloned() {
            self.touch(key);
            return Ok(img);
        }

        let mut rgba = decode_video_frame_rgba8(&self.info, key as f64 / 1000.0)?;
        premultiply_rgba8_in_place(&mut rgba);
        let img = PreparedImage {
            width: self.info.width,
            height: self.info.height,
            rgba8_premul: Arc::new(rgba),
        };
        self.insert(key, img.clone());
        Ok(img)
    }

    /// Cache key in whole milliseconds of source time.
    pub(crate) fn key_for_time(&self, t: f64) -> u64 {
        let mut t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        if let Some(d) = self.info.duration_secs {
            t = t.rem_euclid(d);
        }
        (t * 1000.0).round() as u64
    }

    #[cfg(test)]
    pub(crate) fn cached_len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn insert(&mut self, key: u64, img: PreparedImage) {
        self.frames.insert(key, img);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.frames.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/video.rs"]
mod tests;
