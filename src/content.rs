//! Typed content payloads and their embedding-string encodings.
//!
//! A [`ContentPayload`] is the deserialized `{type, data}` body of a QR
//! entity. [`encode_content`] maps it to the single string embedded in the
//! symbol, following the per-type structuring rules (mailto:, sms:, the
//! WIFI: scheme, vCard 3.0, geo:). Validation is a separate stage:
//! [`ContentPayload::validate`] runs before encoding so that missing
//! required fields surface as typed errors instead of malformed strings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Content of a QR entity, discriminated by the `type` tag.
///
/// Serialized adjacently tagged, matching the service's JSON bodies:
/// `{"type": "WIFI", "data": {"ssid": "...", ...}}`. Unknown tags fail
/// deserialization; the [`ContentPayload::Raw`] variant is the explicit
/// escape hatch for pre-encoded content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "UPPERCASE")]
pub enum ContentPayload {
    /// A URL embedded verbatim; normalization is the caller's concern.
    Url { url: String },
    /// Free text embedded verbatim.
    Text { text: String },
    /// An email compose link.
    Email {
        email: String,
        #[serde(default)]
        subject: Option<String>,
        #[serde(default)]
        body: Option<String>,
    },
    /// A dialer link.
    Phone { phone: String },
    /// An SMS compose link with optional prefilled message.
    Sms {
        phone: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Wi-Fi network credentials in the de-facto `WIFI:` scheme.
    Wifi {
        ssid: String,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        encryption: WifiEncryption,
        #[serde(default)]
        hidden: bool,
    },
    /// A vCard 3.0 contact card.
    #[serde(rename_all = "camelCase")]
    Vcard {
        #[serde(default)]
        first_name: String,
        #[serde(default)]
        last_name: String,
        #[serde(default)]
        organization: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        mobile_phone: Option<String>,
        #[serde(default)]
        work_phone: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        website: Option<String>,
        #[serde(default)]
        street: Option<String>,
        #[serde(default)]
        city: Option<String>,
        #[serde(default)]
        state: Option<String>,
        #[serde(default)]
        zip: Option<String>,
        #[serde(default)]
        country: Option<String>,
    },
    /// A geographic point.
    Location { latitude: f64, longitude: f64 },
    /// Pre-encoded content embedded verbatim.
    Raw { content: String },
}

/// Wi-Fi encryption tag carried in the `T:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA", alias = "wpa")]
    Wpa,
    #[serde(rename = "WEP", alias = "wep")]
    Wep,
    #[serde(rename = "nopass", alias = "none")]
    Nopass,
}

impl WifiEncryption {
    fn as_str(self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::Nopass => "nopass",
        }
    }
}

impl ContentPayload {
    /// The payload's type tag, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentPayload::Url { .. } => "URL",
            ContentPayload::Text { .. } => "TEXT",
            ContentPayload::Email { .. } => "EMAIL",
            ContentPayload::Phone { .. } => "PHONE",
            ContentPayload::Sms { .. } => "SMS",
            ContentPayload::Wifi { .. } => "WIFI",
            ContentPayload::Vcard { .. } => "VCARD",
            ContentPayload::Location { .. } => "LOCATION",
            ContentPayload::Raw { .. } => "RAW",
        }
    }

    /// Checks that every required field is present and usable.
    ///
    /// This is the pre-encoding gate: [`encode_content`] assumes a payload
    /// that passed here. Optional fields are never required; encrypted
    /// Wi-Fi networks additionally require a password.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = |field: &'static str| ValidationError::MissingField {
            kind: self.kind(),
            field,
        };
        let require = |value: &str, field: &'static str| {
            if value.trim().is_empty() {
                Err(missing(field))
            } else {
                Ok(())
            }
        };
        match self {
            ContentPayload::Url { url } => require(url, "url"),
            ContentPayload::Text { text } => require(text, "text"),
            ContentPayload::Email { email, .. } => require(email, "email"),
            ContentPayload::Phone { phone } => require(phone, "phone"),
            ContentPayload::Sms { phone, .. } => require(phone, "phone"),
            ContentPayload::Wifi {
                ssid,
                password,
                encryption,
                ..
            } => {
                require(ssid, "ssid")?;
                if *encryption != WifiEncryption::Nopass
                    && password.as_deref().map_or(true, |p| p.is_empty())
                {
                    return Err(missing("password"));
                }
                Ok(())
            }
            ContentPayload::Vcard {
                first_name,
                last_name,
                ..
            } => {
                if first_name.trim().is_empty() && last_name.trim().is_empty() {
                    return Err(missing("firstName"));
                }
                Ok(())
            }
            ContentPayload::Location {
                latitude,
                longitude,
            } => {
                if !(-90.0..=90.0).contains(latitude) {
                    return Err(ValidationError::LatitudeOutOfRange(*latitude));
                }
                if !(-180.0..=180.0).contains(longitude) {
                    return Err(ValidationError::LongitudeOutOfRange(*longitude));
                }
                Ok(())
            }
            ContentPayload::Raw { content } => require(content, "content"),
        }
    }
}

/// Maps a payload to the string embedded in the symbol.
///
/// Deterministic and lossless for valid payloads. Absent optional fields
/// degrade to omitted segments (an email without subject and body is just
/// `mailto:address`); required-field presence is [`ContentPayload::validate`]'s
/// job, not this function's.
pub fn encode_content(payload: &ContentPayload) -> String {
    match payload {
        ContentPayload::Url { url } => url.clone(),
        ContentPayload::Text { text } => text.clone(),
        ContentPayload::Email {
            email,
            subject,
            body,
        } => {
            let mut params = Vec::new();
            if let Some(subject) = subject {
                params.push(format!("subject={}", urlencoding::encode(subject)));
            }
            if let Some(body) = body {
                params.push(format!("body={}", urlencoding::encode(body)));
            }
            if params.is_empty() {
                format!("mailto:{email}")
            } else {
                format!("mailto:{email}?{}", params.join("&"))
            }
        }
        ContentPayload::Phone { phone } => format!("tel:{phone}"),
        ContentPayload::Sms { phone, message } => match message {
            Some(message) => format!("sms:{phone}?body={}", urlencoding::encode(message)),
            None => format!("sms:{phone}"),
        },
        ContentPayload::Wifi {
            ssid,
            password,
            encryption,
            hidden,
        } => {
            let ssid = escape_wifi_value(ssid);
            let password = escape_wifi_value(password.as_deref().unwrap_or(""));
            let hidden = if *hidden { "H:true;" } else { "" };
            format!(
                "WIFI:S:{ssid};T:{};P:{password};{hidden};",
                encryption.as_str()
            )
        }
        ContentPayload::Vcard {
            first_name,
            last_name,
            organization,
            title,
            mobile_phone,
            work_phone,
            email,
            website,
            street,
            city,
            state,
            zip,
            country,
        } => {
            let mut lines = vec![
                "BEGIN:VCARD".to_owned(),
                "VERSION:3.0".to_owned(),
                format!("N:{last_name};{first_name};;;"),
                format!("FN:{}", format!("{first_name} {last_name}").trim()),
            ];
            let mut push_field = |prefix: &str, value: &Option<String>| {
                if let Some(value) = value {
                    lines.push(format!("{prefix}{value}"));
                }
            };
            push_field("ORG:", organization);
            push_field("TITLE:", title);
            push_field("TEL;TYPE=CELL:", mobile_phone);
            push_field("TEL;TYPE=WORK:", work_phone);
            push_field("EMAIL:", email);
            push_field("URL:", website);
            let address = [street, city, state, zip, country];
            if address.iter().any(|part| part.is_some()) {
                let joined = address
                    .iter()
                    .map(|part| part.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(";");
                lines.push(format!("ADR;TYPE=WORK:{joined}"));
            }
            lines.push("END:VCARD".to_owned());
            lines.join("\n")
        }
        ContentPayload::Location {
            latitude,
            longitude,
        } => format!("geo:{latitude},{longitude}"),
        ContentPayload::Raw { content } => content.clone(),
    }
}

/// Escapes the reserved characters of the `WIFI:` scheme.
///
/// Each of `\`, `;`, `,`, `:` is prefixed with a backslash, in that pass
/// order, so the escape character itself escapes first.
fn escape_wifi_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
