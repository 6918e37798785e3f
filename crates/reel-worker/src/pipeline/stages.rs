//! Operation names written to the timing log.

pub const IMAGE_TO_VIDEO: &str = "IMAGE_TO_VIDEO";
pub const IMAGE_RESOLVE: &str = "IMAGE_RESOLVE";
pub const KEN_BURNS_RENDER: &str = "KEN_BURNS_RENDER";
pub const CAPTION_OVERLAY: &str = "CAPTION_OVERLAY";
pub const SCENE_PUBLISH: &str = "SCENE_PUBLISH";

pub const MERGE_AUDIO: &str = "MERGE_AUDIO";
pub const MERGE_VIDEO_RESOLVE: &str = "MERGE_VIDEO_RESOLVE";
pub const MERGE_AUDIO_RESOLVE: &str = "MERGE_AUDIO_RESOLVE";
pub const MERGE_PROBE: &str = "MERGE_PROBE";
pub const MERGE_MUX: &str = "MERGE_MUX";
pub const KARAOKE_OVERLAY: &str = "KARAOKE_OVERLAY";
pub const MERGE_PUBLISH: &str = "MERGE_PUBLISH";

pub const CONCATENATE: &str = "CONCATENATE";
pub const CONCAT_RESOLVE_ALL: &str = "CONCAT_RESOLVE_ALL";
pub const CONCAT_STREAM_COPY: &str = "CONCAT_STREAM_COPY";
pub const CONCAT_PROBE: &str = "CONCAT_PROBE";
pub const CONCAT_PUBLISH: &str = "CONCAT_PUBLISH";

pub const LOAD_TEST: &str = "LOAD_TEST";
pub const LOAD_TEST_RESOLVE: &str = "LOAD_TEST_RESOLVE";
pub const LOAD_TEST_PROBE: &str = "LOAD_TEST_PROBE";
pub const LOAD_TEST_ENCODE: &str = "LOAD_TEST_ENCODE";
pub const LOAD_TEST_PUBLISH: &str = "LOAD_TEST_PUBLISH";

pub const BATCH_PUBLISH: &str = "BATCH_PUBLISH";
pub const BATCH_PUBLISH_ITEM: &str = "BATCH_PUBLISH_ITEM";

pub const ASSET_DOWNLOAD: &str = "ASSET_DOWNLOAD";
pub const PROJECT_CLEANUP: &str = "PROJECT_CLEANUP";
