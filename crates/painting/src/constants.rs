/// Node property marking a group as a material group.
pub const MATERIAL_GROUP_PROPERTY_KEY: &str = "materialGroup";

/// Node property holding the channel id of a channel layer.
pub const CHANNEL_PROPERTY_KEY: &str = "materialChannel";

/// Tag of the attributed-tree element a channel matrix is stored in.
pub const MATRIX_ELEMENT_TAG: &str = "materialChannelMatrix";

/// Tag of the per-channel compatibility entries inside the matrix element.
pub const LEGACY_CHANNEL_TAG: &str = "channel";

/// Matrix element version that carries flat attributes.
pub const MATRIX_FORMAT_VERSION: i32 = 2;

/// Tolerance used when comparing matrix strengths.
pub const MATRIX_EPSILON: f32 = 1e-4;

/// Lower bound for the height pressure exponent.
pub const MIN_HEIGHT_CREAMINESS: f32 = 0.01;

/// Encoded flat normal (0, 0, 1) with opaque alpha.
pub const FLAT_NORMAL_ENCODED: [f32; 4] = [0.5, 0.5, 1.0, 1.0];
