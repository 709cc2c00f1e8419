//! Token dictionaries
//!
//! Common protocol vocabulary is sent as a short code instead of raw UTF-8:
//! one byte for the single-byte table, two bytes (quadrant tag + index) for
//! the four double-byte quadrants. Both peers must hold identical tables, so
//! the tables are versioned together with the protocol generation
//! ([`DICTIONARY_VERSION`]) and never mutated at runtime.
//!
//! The single-byte table is the web client's published list. The double-byte
//! quadrants are a local generation: the leading entries of quadrant 0 follow
//! the published list, the rest is vocabulary chosen for this crate. Frames
//! that use double-byte codes only interoperate with peers holding the same
//! quadrants, so replace them wholesale when targeting a live server.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::Tag;

/// Protocol generation the tables below belong to
pub const DICTIONARY_VERSION: u8 = 3;

/// Largest number of entries a quadrant can address with one index byte
pub const QUADRANT_MAX: usize = 256;

/// Number of double-byte quadrants
pub const QUADRANT_COUNT: usize = 4;

/// Quadrant tags in quadrant order
const QUADRANT_TAGS: [Tag; QUADRANT_COUNT] = [
    Tag::Dictionary0,
    Tag::Dictionary1,
    Tag::Dictionary2,
    Tag::Dictionary3,
];

/// Single-byte table. Index 0 is reserved (it collides with `LIST_EMPTY`)
/// and every index stays below [`Tag::SINGLE_BYTE_LIMIT`].
pub const SINGLE_BYTE_TOKENS: [&str; Tag::SINGLE_BYTE_LIMIT as usize] = [
    "", "xmlstreamstart", "xmlstreamend", "s.whatsapp.net", "type", "participant", "from", "receipt", "id",
    "notification", "disappearing_mode", "status", "jid", "broadcast", "user", "devices",
    "device_hash", "to", "offline", "message", "result", "class", "xmlns", "duration", "notify",
    "iq", "t", "ack", "g.us", "enc", "urn:xmpp:whatsapp:push", "presence", "config_value",
    "picture", "verified_name", "config_code", "key-index-list", "contact", "mediatype",
    "routing_info", "edge_routing", "get", "read", "urn:xmpp:ping", "fallback_hostname", "0",
    "chatstate", "business_hours_config", "unavailable", "download_buckets", "skmsg",
    "verified_level", "composing", "handshake", "device-list", "media", "text", "fallback_ip4",
    "media_conn", "device", "creation", "location", "config", "item", "fallback_ip6", "count",
    "w:profile:picture", "image", "business", "2", "hostname", "call-creator", "display_name",
    "relaylatency", "platform", "abprops", "success", "msg", "offline_preview", "prop",
    "key-index", "v", "day_of_week", "pkmsg", "version", "1", "ping", "w:p", "download", "video",
    "set", "specific_hours", "props", "primary", "unknown", "hash", "commerce_experience",
    "last", "subscribe", "max_buckets", "call", "profile", "member_since_text", "close_time",
    "call-id", "sticker", "mode", "participants", "value", "query", "profile_options",
    "open_time", "code", "list", "host", "ts", "contacts", "upload", "lid", "preview", "update",
    "usync", "w:stats", "delivery", "auth_ttl", "context", "fail", "cart_enabled", "appdata",
    "category", "atn", "direct_connection", "decrypt-fail", "relay_id",
    "mmg-fallback.whatsapp.net", "target", "available", "name", "last_id", "mmg.whatsapp.net",
    "categories", "401", "is_new", "index", "tctoken", "ip4", "token_id", "latency",
    "recipient", "edit", "ip6", "add", "thumbnail-document", "26", "paused", "true",
    "identity", "stream:error", "key", "sidelist", "background", "audio", "3",
    "thumbnail-image", "biz-cover-photo", "cat", "gcm", "thumbnail-video", "error", "auth",
    "deny", "serial", "in", "registration", "thumbnail-link", "remove", "00", "gif",
    "thumbnail-gif", "tag", "capability", "multicast", "item-not-found", "description",
    "business_hours", "config_expo_key", "md-app-state", "expiration", "fallback", "ttl",
    "300", "md-msg-hist", "device_orientation", "out", "w:m", "open_24h", "side_list", "token",
    "inactive", "01", "document", "te2", "played", "encrypt", "msgr", "hide", "direct_path",
    "12", "state", "not-authorized", "url", "terminate", "signature", "status-revoke-delay",
    "02", "te", "linked_accounts", "trusted_contact", "timezone", "ptt", "kyc-id",
    "privacy_token", "readreceipts", "appointment_only", "address", "expected_ts", "privacy",
    "7", "android", "interactive", "device-identity", "enabled", "attribute_padding", "1080",
    "03", "screen_height",
];

/// Double-byte quadrants, addressed by `DICTIONARY_n` + one index byte
pub const DOUBLE_BYTE_TOKENS: [&[&str]; QUADRANT_COUNT] = [
    &[
        "read-self", "active", "fbns", "protocol", "reaction", "screen_width", "heartbeat",
        "deviceid", "2:47DEQpj8", "uploadfieldstat", "voip_settings", "retry", "priority",
        "longitude", "conflict", "false", "ig_professional", "replaced", "preaccept",
        "cover_photo", "uncompressed", "encopt", "ppic", "04", "passive", "status-revoke-drop",
        "keygen", "540", "offer", "rate", "opus", "latitude", "w:gp2", "ver", "4",
        "business_profile", "medium", "sender", "prev_v_id", "email", "website", "invited",
        "sign_credential", "05", "transport", "skey", "reason", "peer_abtest_bucket",
        "America/Sao_Paulo", "appid", "refresh", "100", "06", "404", "101", "104", "107", "102",
        "109", "103", "member_add_mode", "105", "transaction-id", "110", "106", "outgoing",
        "108", "111", "tokens", "followers", "cell_center_lat", "cell_center_lng",
        "cell_center_radius", "accept", "invite", "group_info", "creator", "subject", "s_t",
        "s_o", "announcement", "not_announcement", "locked", "unlocked", "ephemeral", "demote",
        "promote", "leave", "modify", "admin", "superadmin", "request", "membership_approval_mode",
        "parent", "linked_parent", "allow_non_admin_sub_group_creation", "sub_group_suggestions",
        "default_sub_group", "incognito", "support", "growth_lock", "suspended", "terminated",
        "reachout_timelock", "privacy_mode_ts", "verified", "push_name", "phash", "addressing_mode",
        "pn", "sender_pn", "sender_lid", "recipient_pn", "peer_recipient_pn", "participant_pn",
        "participant_lid", "author", "verified_name_cert", "bot", "plaintext", "hsm",
        "biz_bot", "native_flow", "pin", "unpin", "poll", "comment", "meta",
    ],
    &[
        "w:g2", "w:mex", "w:sync:app:state", "encrypt_v2", "newsletter", "mute", "unmute",
        "follow", "unfollow", "reactions", "view_count", "server_id", "live_updates",
        "messages", "message_updates", "before", "after", "since", "invite_code", "thread",
        "thread_metadata", "viewer_metadata", "role", "subscriber", "owner", "guest", "mms",
        "hosted", "sticker_pack", "collection", "catalog", "product", "product_catalog",
        "width", "height", "limit", "cursor", "page", "direction", "backward", "forward",
        "bizjid", "biz_opaque_data", "order", "cart", "thumbnail", "video-thumbnail",
        "direct_path_v2", "media_key", "file_sha256", "file_enc_sha256", "file_length",
        "mimetype", "caption", "seconds", "jpeg_thumbnail", "streaming_sidecar", "waveform",
        "view_once", "revoke", "sender_revoke", "admin_revoke", "keep_in_chat", "history_sync",
        "initial_bootstrap", "recent", "full", "push_name_update", "app_state_sync_key_share",
        "app_state_sync_key_request", "app_state_fatal_exception", "key_id", "key_data",
        "fingerprint", "raw_id", "current_index", "valid_indexes", "collection_name",
        "regular", "regular_low", "regular_high", "critical_block", "critical_unblock_low",
        "patch", "patches", "snapshot", "return_snapshot", "mutations", "mutation",
        "operation", "index_mac", "value_mac", "snapshot_mac", "patch_mac", "blob",
        "external_blob", "sync", "server_sync", "dirty", "clean", "timestamp", "unread",
        "mark_read", "archive", "star", "delete", "clear", "pin_v1", "contact_action",
        "quick_reply", "label_edit", "label_jid", "label_message", "locale", "settings",
        "security", "two_factor", "code_type", "backup_token", "backup_key",
        "companion_enc_static", "companion_ephemeral_identity", "device_props", "link_code",
        "link_code_companion_reg", "primary_identity_pub", "primary_ephemeral_pub_wrapped",
        "companion_platform_id",
    ],
    &[
        "pair-device", "pair-success", "pair-device-sign", "ref", "device-identity-v2",
        "key-bundle", "registration_id", "skey_id", "identity_key", "prekey", "prekeys",
        "prekey_count", "signed_prekey", "one_time_prekey", "digest", "encrypt_retry",
        "retry_count", "retry_reason", "bad_mac", "no_session", "stale", "biz", "smb",
        "enterprise", "catalog_status", "message_addon", "reporting", "reporting_token",
        "reporting_tag", "franking", "franking_tag", "hmac", "encrypted_hash", "stanza_id",
        "stanza_type", "edge", "edge_id", "call-offer", "call-accept", "call-reject",
        "call-terminate", "call-preaccept", "relay", "relay_election", "te_ip4", "te_ip6",
        "token_retry", "video_state", "audio_state", "group_call", "joinable", "link_token",
        "capability_bits", "voip", "webrtc", "srtp", "net", "medium_id", "protocol_version",
        "enc_rekey", "transport_message", "accept_receipt", "offer_notice", "mute_v2",
        "screen_share", "peer_state", "battery", "low_battery", "charging", "web_client",
        "desktop", "ios", "smbi", "smba", "wear_os", "portal", "tv", "vr", "kaios", "macos",
        "windows", "ipad", "android_tablet", "android_ambiguous", "chrome", "firefox", "safari",
        "edge_browser", "opera", "electron", "uwp", "catalyst", "unknown_platform",
        "app_version", "os_version", "os_build_number", "manufacturer", "device_model",
        "mcc", "mnc", "locale_language", "locale_country", "release_channel", "beta", "alpha",
        "debug", "release", "phone_id", "device_board", "device_exp_id", "device_type",
        "client_payload", "user_agent", "web_info", "connect_type", "connect_reason",
        "wifi_unknown", "cellular_edge", "cellular_3g", "cellular_lte", "cellular_5g",
        "user_activated", "scheduled", "error_reconnect", "push", "lc", "passive_reconnect",
        "pull",
    ],
    &[
        "w:biz", "w:biz:catalog", "w:comms:chat", "w:auth:backup:token", "w:sync:app:state:v2",
        "urn:xmpp:whatsapp:account", "urn:xmpp:whatsapp:dirty", "urn:xmpp:whatsapp:mms",
        "privacy_settings", "last_seen", "online", "profile_photo", "about", "groupadd",
        "calladd", "readreceipts_v2", "messages_ttl", "stickers", "all", "contacts_except",
        "contact_blacklist", "none", "match_last_seen", "blocklist", "block", "unblock",
        "dhash", "disappearing_mode_v2", "default_disappearing", "ephemeral_setting",
        "ephemeral_expiration", "keep_v2", "initiator", "trigger", "chat_settings",
        "account_sync", "picture_update", "status_update", "text_status", "emoji",
        "ephemeral_duration", "set_ts", "business_name", "profile_name", "short_name",
        "vname", "vlevel", "serial_v2", "issuer", "expires", "high", "low", "unverified",
        "dialog", "banner", "tos", "tos_notice", "notice_id", "stage", "accept_tos",
        "notice", "wam", "field_stats", "buffer", "wam_buffer", "sequence", "sequence_number",
        "channel", "realtime", "private_stats", "anonymous", "props_hash", "experiments",
        "experiment", "gk", "gatekeeper", "config_key", "config_expo", "abkey", "refresh_id",
        "delta", "delta_update", "hash_v2", "media_upload", "upload_token", "auth_token",
        "max_retries", "backoff", "host_type", "primary_host", "fallback_host", "media_types",
        "force_ip4", "force_ip6", "md_sync", "spam", "spam_list", "report", "spam_flow",
        "message_report", "account_report", "trust_tier", "safety", "restrict", "restricted",
        "unrestrict", "lock", "unlock", "reachout", "frequently_forwarded", "forwarded",
        "forwarding_score", "quoted", "mentions", "mentioned_jid", "group_mentions",
        "edit_v2", "edit_count", "original_id", "latest_edit", "keep_in_chat_v2",
        "pin_in_chat", "poll_creation", "poll_update", "poll_vote", "event_response",
        "encrypted_reaction", "revoke_v2",
    ],
];

/// Dictionary position of a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Index into the single-byte table, written as the tag byte itself
    SingleByte(u8),
    /// Quadrant tag and index into that quadrant
    DoubleByte {
        /// `DICTIONARY_0..=3`
        dictionary: Tag,
        /// Index within the quadrant
        index: u8,
    },
}

impl Token {
    /// Encoded size in bytes
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        match self {
            Self::SingleByte(_) => 1,
            Self::DoubleByte { .. } => 2,
        }
    }
}

static TOKEN_INDEX: LazyLock<HashMap<&'static str, Token>> = LazyLock::new(build_index);

fn build_index() -> HashMap<&'static str, Token> {
    let capacity = DOUBLE_BYTE_TOKENS.iter().map(|table| table.len()).sum::<usize>();
    let mut index = HashMap::with_capacity(SINGLE_BYTE_TOKENS.len() + capacity);
    for (position, token) in (0u8..).zip(SINGLE_BYTE_TOKENS) {
        if !token.is_empty() {
            index.entry(token).or_insert(Token::SingleByte(position));
        }
    }
    for (dictionary, table) in QUADRANT_TAGS.into_iter().zip(DOUBLE_BYTE_TOKENS) {
        for (position, token) in (0u8..).zip(table.iter().copied()) {
            index.entry(token).or_insert(Token::DoubleByte {
                dictionary,
                index: position,
            });
        }
    }
    index
}

/// Dictionary code for `value`, single-byte table first
#[must_use]
pub fn lookup(value: &str) -> Option<Token> {
    TOKEN_INDEX.get(value).copied()
}

/// String behind a single-byte code; the reserved index 0 has none
#[must_use]
pub fn single_byte(index: u8) -> Option<&'static str> {
    match index {
        0 => None,
        _ => SINGLE_BYTE_TOKENS.get(usize::from(index)).copied(),
    }
}

/// String behind a double-byte code; `None` for a non-dictionary tag or an
/// index past the end of its quadrant
#[must_use]
pub fn double_byte(dictionary: Tag, index: u8) -> Option<&'static str> {
    DOUBLE_BYTE_TOKENS
        .get(usize::from(dictionary.quadrant()?))?
        .get(usize::from(index))
        .copied()
}
