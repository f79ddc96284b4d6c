use serde::{Deserialize, Serialize};

/// Delivery style applied on top of the configured rate and pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceStyle {
    #[default]
    Neutral,
    Expressive,
    IdentityLike,
}

/// Voice identity and prosody for one synthesis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    /// Synthesis voice name (e.g., "fr-FR-DeniseNeural")
    pub name: String,
    /// Relative speaking rate (e.g., "0%", "+10%", "-5%")
    pub rate: String,
    /// Pitch keyword ("default", "low", "medium", "high")
    pub pitch: String,
    pub style: VoiceStyle,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            name: "en-US-JennyNeural".to_string(),
            rate: "0%".to_string(),
            pitch: "default".to_string(),
            style: VoiceStyle::Neutral,
        }
    }
}

impl VoiceParams {
    /// Resolve the style into concrete rate and pitch.
    ///
    /// Styles only touch values left at their neutral setting.
    pub fn styled(&self) -> (String, String) {
        let mut rate = self.rate.clone();
        let mut pitch = self.pitch.clone();

        match self.style {
            VoiceStyle::Neutral => {}
            VoiceStyle::Expressive => {
                if rate == "0%" {
                    rate = "+5%".to_string();
                }
                if pitch == "medium" {
                    pitch = "high".to_string();
                }
            }
            VoiceStyle::IdentityLike => {
                if rate == "0%" {
                    rate = "-5%".to_string();
                }
                if pitch == "medium" {
                    pitch = "low".to_string();
                }
            }
        }

        (rate, pitch)
    }

    /// Copy of these parameters with a different rate
    pub fn with_rate(&self, rate: impl Into<String>) -> Self {
        Self {
            rate: rate.into(),
            ..self.clone()
        }
    }

    /// Build the SSML document sent to the synthesis service
    pub fn to_ssml(&self, text: &str) -> String {
        let (rate, pitch) = self.styled();
        format!(
            concat!(
                r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="en-US">"#,
                r#"<voice name="{}"><prosody rate="{}" pitch="{}">{}</prosody></voice></speak>"#
            ),
            escape_xml(&self.name),
            escape_xml(&rate),
            escape_xml(&pitch),
            escape_xml(text)
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Speed up a segment whose translation is too dense for its source slot.
///
/// Returns the signed percentage rate to synthesize with.
pub fn density_adjusted_rate(base_rate: &str, text: &str, slot_secs: f64) -> String {
    let base: i64 = base_rate.trim().trim_end_matches('%').parse().unwrap_or(0);

    let density = text.chars().count() as f64 / (slot_secs.max(0.0) + 0.1);
    let boost = if density > 20.0 {
        (((density - 20.0) * 5.0) as i64).min(50)
    } else {
        0
    };

    let rate = base + boost;
    if rate > 0 {
        format!("+{}%", rate)
    } else {
        format!("{}%", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_adjustments() {
        let mut voice = VoiceParams {
            pitch: "medium".to_string(),
            ..Default::default()
        };
        assert_eq!(voice.styled(), ("0%".to_string(), "medium".to_string()));

        voice.style = VoiceStyle::Expressive;
        assert_eq!(voice.styled(), ("+5%".to_string(), "high".to_string()));

        voice.style = VoiceStyle::IdentityLike;
        assert_eq!(voice.styled(), ("-5%".to_string(), "low".to_string()));

        // Explicit values are left alone
        voice.rate = "+20%".to_string();
        assert_eq!(voice.styled().0, "+20%");
    }

    #[test]
    fn test_ssml_escapes_text() {
        let voice = VoiceParams::default();
        let ssml = voice.to_ssml("Fish & <chips>");
        assert!(ssml.contains(r#"<voice name="en-US-JennyNeural">"#));
        assert!(ssml.contains(r#"<prosody rate="0%" pitch="default">"#));
        assert!(ssml.contains("Fish &amp; &lt;chips&gt;"));
    }

    #[test]
    fn test_density_rate_boost() {
        // 10 chars over ~1s: no boost
        assert_eq!(density_adjusted_rate("0%", "abcdefghij", 0.9), "0%");
        // 40 chars over 1.9s + 0.1 = 20 chars/s: still no boost
        assert_eq!(density_adjusted_rate("-10%", &"a".repeat(40), 1.9), "-10%");
        // 60 chars over 1.9s + 0.1 = 30 chars/s -> +50 (capped)
        assert_eq!(density_adjusted_rate("0%", &"a".repeat(60), 1.9), "+50%");
        // 45 chars over 2s -> 22.5 chars/s -> +12
        assert_eq!(density_adjusted_rate("+5%", &"a".repeat(45), 1.9), "+17%");
        // Garbage base counts as zero
        assert_eq!(density_adjusted_rate("fast", "hi", 1.0), "0%");
    }
}
