use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SegmentRequest {
    pub slug: String,
}

/// One entry of a membership batch; also the shape echoed back on add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSlug {
    pub slug: String,
}
