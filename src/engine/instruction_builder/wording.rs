use crate::domain::schedule::{ScheduleInterval, DATE_FORMAT};
use crate::domain::step::DOSE_EPSILON;
use crate::domain::types::TimeOfDay;

const COUNT_WORDS: [&str; 11] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// 0–10 用英文单词，更大的数用数字
pub fn count_word(n: u32) -> String {
    COUNT_WORDS
        .get(n as usize)
        .map(|w| (*w).to_string())
        .unwrap_or_else(|| n.to_string())
}

/// 规格文本，去掉多余的零：0.5 → "0.5mg"，2 → "2mg"
pub fn format_strength(strength_mg: f64) -> String {
    format!("{}mg", strength_mg)
}

/// 单个时段的服药短语
///
/// - N 整片: "two tablets of 1mg alprazolam at Night"（1 片用单数）
/// - 半片: "half a 10mg tablet of diazepam at Night"
/// - N 片半: "one and a half tablets of 0.5mg ..." / "two and a half tablets of ..."
pub fn slot_phrase(count: f64, strength_mg: f64, medication: &str, slot: TimeOfDay) -> String {
    let whole = (count + DOSE_EPSILON).floor();
    let has_half = (count - whole).abs() >= DOSE_EPSILON;
    let whole = whole as u32;
    let strength = format_strength(strength_mg);
    let prep = slot.preposition();

    if !has_half {
        let noun = if whole == 1 { "tablet" } else { "tablets" };
        return format!(
            "{} {} of {} {} {}",
            count_word(whole),
            noun,
            strength,
            medication,
            prep
        );
    }

    match whole {
        0 => format!("half a {} tablet of {} {}", strength, medication, prep),
        n => format!(
            "{} and a half tablets of {} {} {}",
            count_word(n),
            strength,
            medication,
            prep
        ),
    }
}

/// 单个短语原样返回；多个短语用 ", " 连接，最后一个前加 ", and "
pub fn join_phrases(phrases: &[String]) -> String {
    match phrases {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// "Take <短语> for W week(s) (from MM/DD/YYYY to MM/DD/YYYY)."
pub(super) fn instruction_sentence(phrases: &[String], interval: &ScheduleInterval) -> String {
    let unit = if interval.weeks == 1 { "week" } else { "weeks" };
    format!(
        "Take {} for {} {} (from {} to {}).",
        join_phrases(phrases),
        interval.weeks,
        unit,
        interval.start_date.format(DATE_FORMAT),
        interval.end_date.format(DATE_FORMAT)
    )
}
