//! Statistics display and formatting

use srtp::{EngineStats, StreamStats};

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// One-line summary of a stream's counters
pub fn format_compact_stats(stats: &StreamStats) -> String {
    format!(
        "protected: {} ({}) | unprotected: {} ({}) | dropped: {}",
        stats.packets_protected,
        format_bytes(stats.bytes_protected),
        stats.packets_unprotected,
        format_bytes(stats.bytes_unprotected),
        stats.dropped()
    )
}

/// Drop counters as `reason: count` pairs, zero counters omitted
pub fn format_drops(stats: &StreamStats) -> String {
    let drops = [
        ("auth", stats.auth_failures),
        ("replay", stats.replay_duplicates),
        ("too-old", stats.replay_too_old),
        ("malformed", stats.malformed),
        ("mki", stats.mki_mismatches),
        ("key-state", stats.key_state_errors),
    ];

    let parts: Vec<String> = drops
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(reason, count)| format!("{}: {}", reason, count))
        .collect();

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// Print engine statistics to stderr
pub fn display_engine_stats(stats: &EngineStats) {
    eprintln!("┌─────────────────────────────────────────────────────────────┐");
    eprintln!("│ SRTP STATISTICS                                             │");
    eprintln!("├─────────────────────────────────────────────────────────────┤");
    eprintln!("│ RTP:   {}", format_compact_stats(&stats.rtp));
    eprintln!("│        drops: {}", format_drops(&stats.rtp));
    eprintln!("│ RTCP:  {}", format_compact_stats(&stats.rtcp));
    eprintln!("│        drops: {}", format_drops(&stats.rtcp));
    eprintln!("└─────────────────────────────────────────────────────────────┘");
}
