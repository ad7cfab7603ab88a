pub const SLOTS_PER_DAY: usize = 8;

/// Lunch break, never assignable
pub const BREAK_SLOT: usize = 4;

/// Start and end time of every slot, identical on all days
pub const TIME_SLOTS: [(&str, &str); SLOTS_PER_DAY] = [
    ("09:00", "09:55"),
    ("09:55", "10:50"),
    ("11:05", "12:00"),
    ("12:00", "12:55"),
    ("12:55", "13:45"),
    ("13:45", "14:40"),
    ("14:40", "15:35"),
    ("15:35", "16:30"),
];

pub fn is_break(slot: usize) -> bool {
    slot == BREAK_SLOT
}

/// Slot indices that can hold a session, in day order
pub fn teaching_slots() -> impl Iterator<Item = usize> {
    (0..SLOTS_PER_DAY).filter(|&slot| !is_break(slot))
}

/// Converts a 24h "HH:MM" string to "HH:MM AM/PM"
pub fn to_twelve_hour(time_str: &str) -> Option<String> {
    let (hour, minute) = time_str.split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute = minute.trim();
    if hour >= 24 || minute.len() != 2 {
        return None;
    }
    let period = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    Some(format!("{:02}:{} {}", display_hour, minute, period))
}

/// Formats a slot's time range, e.g. "09:00 AM TO 09:55 AM"
pub fn slot_to_time(slot: usize) -> String {
    match TIME_SLOTS.get(slot) {
        Some((start, end)) => {
            let start = to_twelve_hour(start).unwrap_or_else(|| start.to_string());
            let end = to_twelve_hour(end).unwrap_or_else(|| end.to_string());
            format!("{} TO {}", start, end)
        }
        None => String::new(),
    }
}
