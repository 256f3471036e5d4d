//! Built-in channel presets offered when adding a channel.

use serde_json::{json, Map, Value};

/// Name of the preset used when a new channel is added without settings.
pub const DEFAULT_PRESET: &str = "Default";

/// Presets shipped with the server. A `presets` document in the settings
/// collection takes precedence over these.
pub fn builtin_presets() -> Map<String, Value> {
    let presets = json!({
        DEFAULT_PRESET: preset("18:00", 60, "default", true, true),
        "Horror": preset("22:00", 90, "deep-narrator", true, true),
        "Relationship": preset("19:30", 75, "warm-female", true, false),
    });

    match presets {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn preset(upload_time: &str, length: u32, voice_id: &str, subtitles: bool, thumbnail: bool) -> Value {
    json!({
        "channel-settings": {
            "upload-time": upload_time
        },
        "video-settings": {
            "text": { "length": length },
            "audio": { "voiceid": voice_id },
            "video": { "subtitles": subtitles },
            "thumbnail": { "create": thumbnail }
        }
    })
}
