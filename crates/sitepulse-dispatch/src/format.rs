//! Locale-specific message formatting.
//!
//! Formatting happens at dispatch time, so the alerting and scheduling
//! components stay free of presentation text. The Arabic formatter keeps
//! the bilingual bodies site crews are used to; script direction is the
//! messaging client's concern.

use crate::message::OutboundMessage;

/// Turns a semantic message into delivery text.
pub trait MessageFormatter: Send + Sync {
    /// Renders the message body.
    fn format(&self, message: &OutboundMessage) -> String;
}

/// Returns the formatter for a locale code; unknown codes fall back to
/// Arabic, the deployment default.
pub fn formatter_for(locale: &str) -> Box<dyn MessageFormatter> {
    match locale {
        "en" => Box::new(EnglishFormatter),
        _ => Box::new(ArabicFormatter),
    }
}

/// Bilingual Arabic/English formatter (default).
pub struct ArabicFormatter;

impl MessageFormatter for ArabicFormatter {
    fn format(&self, message: &OutboundMessage) -> String {
        match message {
            OutboundMessage::WindAlert { wind_speed_kmh } => format!(
                "⚠️ تنبيه رياح قوية / High Wind Alert\n\
                 سرعة الرياح {wind_speed_kmh:.1} كم/س. يرجى توخي الحذر وإيقاف الرافعات.\n\
                 Wind speed is {wind_speed_kmh:.1} km/h. Please exercise caution and stop cranes."
            ),
            OutboundMessage::RainAlert {
                rain_probability_pct,
            } => format!(
                "🌧️ احتمالية أمطار / Rain Forecast\n\
                 توجد فرصة هطول أمطار بنسبة {rain_probability_pct:.0}% خلال الساعات القادمة.\n\
                 There is a {rain_probability_pct:.0}% chance of rain in the coming hours."
            ),
            OutboundMessage::SafetyTip { tip } => tip.clone(),
            OutboundMessage::ActivityReminder => "صباح الخير، معكم المنسق الذكي للموقع. 👷‍♂️🤖\n\
                 يرجى البدء بإرسال تفاصيل العمل والأنشطة والصور ليتسنى لي إعداد التقرير اليومي \
                 للموقع. 📝📸"
                .to_string(),
            OutboundMessage::ReportReady {
                report_id,
                report_date,
                ..
            } => format!(
                "📄 تقرير الموقع اليومي {report_id} بتاريخ {report_date}\n\
                 Daily site report {report_id} for {report_date}."
            ),
            OutboundMessage::Plain { text } => text.clone(),
        }
    }
}

/// English-only formatter.
pub struct EnglishFormatter;

impl MessageFormatter for EnglishFormatter {
    fn format(&self, message: &OutboundMessage) -> String {
        match message {
            OutboundMessage::WindAlert { wind_speed_kmh } => format!(
                "⚠️ High Wind Alert: wind speed is {wind_speed_kmh:.1} km/h. \
                 Please exercise caution and stop cranes."
            ),
            OutboundMessage::RainAlert {
                rain_probability_pct,
            } => format!(
                "🌧️ Rain Forecast: {rain_probability_pct:.0}% chance of rain in the coming hours."
            ),
            OutboundMessage::SafetyTip { tip } => tip.clone(),
            OutboundMessage::ActivityReminder => "Good morning! No site activity has been logged \
                 yet today. Please send work details, activities, and photos so the daily report \
                 can be compiled. 📝📸"
                .to_string(),
            OutboundMessage::ReportReady {
                report_id,
                report_date,
                ..
            } => format!("📄 Daily site report {report_id} for {report_date}."),
            OutboundMessage::Plain { text } => text.clone(),
        }
    }
}
