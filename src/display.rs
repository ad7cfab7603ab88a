use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::conflict::TeacherMatch;
use crate::schedule::grid::{DayRow, Grid};
use crate::schedule::slot_utils::{is_break, slot_to_time, SLOTS_PER_DAY};
use crate::schedule::types::{Batch, CellAssignment, Category, Day, GeneratedTimetable, Track};

/// Longest short name kept when a subject name has no abbreviation
pub const SHORT_NAME_MAX: usize = 12;

/// Derives a short display name from a subject's full name.
///
/// "SMA (Simulation Modelling & Analysis)" gives the parenthesised part,
/// "IM-Digital Manufacturing" the part after the hyphen, anything else is
/// cut to `SHORT_NAME_MAX` characters.
pub fn short_name(name: &str) -> String {
    if let Some((_, rest)) = name.split_once('(') {
        return rest.split(')').next().unwrap_or(rest).to_string();
    }
    if let Some((_, rest)) = name.split_once('-') {
        return rest.split('-').next().unwrap_or(rest).trim().to_string();
    }
    name.chars().take(SHORT_NAME_MAX).collect::<String>().trim_end().to_string()
}

/// One or two letter initials: first letters of the first two words, or the
/// first two characters of a single word
pub fn teacher_initials(teacher: &str) -> String {
    let parts: Vec<&str> = teacher.split_whitespace().collect();
    if parts.len() >= 2 {
        parts[..2].iter().filter_map(|p| p.chars().next()).collect::<String>().to_uppercase()
    } else {
        teacher.trim().chars().take(2).collect::<String>().to_uppercase()
    }
}

/// Formats a cell as "IM51-SMA (SK)", or "FPD-FPD Lab Lab-B1(SS)" for a batch lab
pub fn format_subject_display(cell: &CellAssignment, batch: Option<Batch>) -> String {
    let short = short_name(&cell.name);
    let initials = teacher_initials(&cell.teacher);
    match (cell.category, batch) {
        (Category::Lab, Some(batch)) => format!(
            "{}-{} Lab-{}({})",
            cell.subject.replace(" Lab", ""),
            short,
            batch,
            initials
        ),
        _ => format!("{}-{} ({})", cell.subject, short, initials),
    }
}

/// Text shown for one cell of a rendered track.
///
/// Batch views fall back to the cohort-wide session. The main view shows the
/// three parallel electives when every batch has one in that slot.
pub fn cell_label(grid: &Grid, track: Track, day: Day, slot: usize) -> String {
    if is_break(slot) {
        return "BREAK".to_string();
    }
    match track {
        Track::Batch(batch) => {
            if let Some(cell) = grid.cell(track, day, slot) {
                format_subject_display(cell, Some(batch))
            } else if let Some(cell) = grid.cell(Track::Main, day, slot) {
                format_subject_display(cell, None)
            } else {
                String::new()
            }
        }
        Track::Main => {
            if let Some(cell) = grid.cell(Track::Main, day, slot) {
                return format_subject_display(cell, None);
            }
            let electives: Vec<String> = Batch::ALL
                .into_iter()
                .filter_map(|b| grid.cell(Track::Batch(b), day, slot))
                .filter(|c| c.category == Category::Elective)
                .map(|c| format_subject_display(c, None))
                .collect();
            if electives.len() == Batch::ALL.len() {
                electives.join(", ")
            } else {
                String::new()
            }
        }
    }
}

pub fn track_title(track: Track) -> String {
    match track {
        Track::Main => "Main".to_string(),
        Track::Batch(b) => format!("Batch {}", b),
    }
}

fn time_label(slot: usize) -> String {
    if is_break(slot) {
        "BREAK".to_string()
    } else {
        slot_to_time(slot)
    }
}

/// Prints every track of a timetable and any unplaced requirements
pub fn print_timetable(timetable: &GeneratedTimetable) {
    for track in Grid::tracks() {
        println!("\n=== {} Timetable ===", track_title(track));
        for slot in 0..SLOTS_PER_DAY {
            println!("  {}", time_label(slot));
            if is_break(slot) {
                continue;
            }
            for day in Day::ALL {
                let label = cell_label(&timetable.grid, track, day, slot);
                if !label.is_empty() {
                    println!("    {:<9} {}", day.name(), label);
                }
            }
        }
    }

    if !timetable.shortfalls.is_empty() {
        println!("\n⚠️  Unplaced requirements ({}):", timetable.shortfalls.len());
        for s in &timetable.shortfalls {
            let day = s.day.map(|d| format!(" on {}", d)).unwrap_or_default();
            let batch = s.batch.map(|b| format!(" for {}", b)).unwrap_or_default();
            println!("  - {:?} {}{}{}: {} session(s) missing", s.kind, s.subject, day, batch, s.missing);
        }
    }
}

/// Writes one track to a text file, one line per slot: TIME | Monday | ... | Saturday
pub fn write_track_to_file(grid: &Grid, track: Track, filename: &str) -> Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "** {} **", track_title(track))?;
    for slot in 0..SLOTS_PER_DAY {
        let labels: Vec<String> = Day::ALL
            .into_iter()
            .map(|day| {
                let label = cell_label(grid, track, day, slot);
                if label.is_empty() {
                    "[EMPTY]".to_string()
                } else {
                    label
                }
            })
            .collect();
        writeln!(file, "{} | {}", time_label(slot), labels.join(" | "))?;
    }

    Ok(())
}

/// Writes every track as CSV rows: track, time, then one column per day
pub fn write_csv<W: Write>(grid: &Grid, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["track".to_string(), "time".to_string()];
    header.extend(Day::ALL.iter().map(|d| d.name().to_string()));
    wtr.write_record(&header)?;

    for track in Grid::tracks() {
        for slot in 0..SLOTS_PER_DAY {
            let mut record = vec![track_title(track), time_label(slot)];
            record.extend(Day::ALL.into_iter().map(|day| cell_label(grid, track, day, slot)));
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Renders the CSV export into memory
pub fn csv_bytes(grid: &Grid) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(grid, &mut buffer)?;
    Ok(buffer)
}

/// Export file name stamped with the local time
pub fn export_filename() -> String {
    format!("timetable_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// JSON shape of a grid: day -> slot cells, per track
#[derive(Debug, Serialize)]
pub struct TimetableView<'a> {
    pub main: BTreeMap<Day, &'a DayRow>,
    pub batches: BTreeMap<Batch, BTreeMap<Day, &'a DayRow>>,
}

impl<'a> TimetableView<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        let rows = |track: Track| -> BTreeMap<Day, &'a DayRow> {
            Day::ALL.into_iter().map(|day| (day, grid.matrix(track).row(day))).collect()
        };
        Self {
            main: rows(Track::Main),
            batches: Batch::ALL.into_iter().map(|b| (b, rows(Track::Batch(b)))).collect(),
        }
    }
}

/// Owned form of `TimetableView`, as sent back by a client
#[derive(Debug, Deserialize)]
pub struct TimetableDocument {
    #[serde(default)]
    pub main: BTreeMap<Day, DayRow>,
    #[serde(default)]
    pub batches: BTreeMap<Batch, BTreeMap<Day, DayRow>>,
}

impl TimetableDocument {
    /// Rebuilds the grid cell by cell; a session in the break slot is an error
    pub fn into_grid(self, teacher_match: TeacherMatch) -> Result<Grid> {
        let mut grid = Grid::new(teacher_match);
        let tracks = std::iter::once((Track::Main, self.main))
            .chain(self.batches.into_iter().map(|(b, rows)| (Track::Batch(b), rows)));
        for (track, rows) in tracks {
            for (day, row) in rows {
                for (slot, cell) in row.into_iter().enumerate() {
                    if let Some(cell) = cell {
                        grid.assign(track, day, slot, cell)?;
                    }
                }
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_rules() {
        assert_eq!(short_name("SMA (Simulation Modelling & Analysis)"), "Simulation Modelling & Analysis");
        assert_eq!(short_name("IM-Digital Manufacturing"), "Digital Manufacturing");
        assert_eq!(short_name("A-B-C"), "B");
        assert_eq!(short_name("Risk Management"), "Risk Managem");
        assert_eq!(short_name("FPD Lab"), "FPD Lab");
        assert_eq!(short_name("Research Methodology & IPR"), "Research Met");
    }

    #[test]
    fn test_teacher_initials() {
        assert_eq!(teacher_initials("Sunil Kumar"), "SK");
        assert_eq!(teacher_initials("dr rao kiran"), "DR");
        assert_eq!(teacher_initials("Hema"), "HE");
        assert_eq!(teacher_initials("x"), "X");
        assert_eq!(teacher_initials(""), "");
        assert_eq!(teacher_initials("SK, Sudheer"), "SS");
    }

    #[test]
    fn test_format_subject_display() {
        let core = CellAssignment::core("IM51", "SMA (Simulation)", "Sunil Kumar");
        assert_eq!(format_subject_display(&core, None), "IM51-Simulation (SK)");

        let lab = CellAssignment::lab("IML56 Lab", "X-FPD", "SK/SDK");
        assert_eq!(format_subject_display(&lab, Some(Batch::B1)), "IML56-FPD Lab-B1(SK)");
        assert_eq!(format_subject_display(&lab, None), "IML56 Lab-FPD (SK)");
    }

    #[test]
    fn test_cell_label_views() {
        let mut grid = Grid::default();
        grid.assign(Track::Main, Day::Monday, 0, CellAssignment::core("IM53", "OM (Ops)", "Meena")).unwrap();
        for (b, code) in Batch::ALL.into_iter().zip(["E1", "E2", "E3"]) {
            grid.assign(Track::Batch(b), Day::Monday, 1, CellAssignment::elective(code, "Elec", "T")).unwrap();
        }

        assert_eq!(cell_label(&grid, Track::Batch(Batch::B2), Day::Monday, 0), "IM53-Ops (ME)");
        assert_eq!(cell_label(&grid, Track::Batch(Batch::B2), Day::Monday, 1), "E2-Elec (T)");
        assert_eq!(
            cell_label(&grid, Track::Main, Day::Monday, 1),
            "E1-Elec (T), E2-Elec (T), E3-Elec (T)"
        );
        assert_eq!(cell_label(&grid, Track::Main, Day::Monday, 4), "BREAK");
        assert_eq!(cell_label(&grid, Track::Main, Day::Monday, 2), "");
    }

    #[test]
    fn test_csv_export_has_row_per_track_slot() {
        let mut grid = Grid::default();
        grid.assign(Track::Main, Day::Friday, 7, CellAssignment::core("IM53", "OM (Ops)", "Meena")).unwrap();

        let text = String::from_utf8(csv_bytes(&grid).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 4 * SLOTS_PER_DAY);
        assert_eq!(lines[0], "track,time,Monday,Tuesday,Wednesday,Thursday,Friday,Saturday");
        assert_eq!(lines[5], "Main,BREAK,BREAK,BREAK,BREAK,BREAK,BREAK,BREAK");
        assert!(lines[8].ends_with(",IM53-Ops (ME),"));
    }

    #[test]
    fn test_view_json_shape() {
        let mut grid = Grid::default();
        grid.assign(Track::Batch(Batch::B3), Day::Tuesday, 2, CellAssignment::lab("ERP Lab", "ERP Lab", "A, B"))
            .unwrap();
        let json = serde_json::to_value(TimetableView::new(&grid)).unwrap();

        assert_eq!(json["main"]["Monday"].as_array().unwrap().len(), SLOTS_PER_DAY);
        assert_eq!(json["batches"]["B3"]["Tuesday"][2]["subject"], "ERP Lab");
        assert_eq!(json["batches"]["B3"]["Tuesday"][2]["type"], "lab");
        assert!(json["batches"]["B1"]["Tuesday"][2].is_null());
    }

    #[test]
    fn test_document_rebuilds_viewed_grid() {
        let mut grid = Grid::new(TeacherMatch::PerTeacher);
        grid.assign(Track::Main, Day::Monday, 0, CellAssignment::core("IM53", "OM (Ops)", "Meena")).unwrap();
        grid.assign(Track::Batch(Batch::B2), Day::Saturday, 7, CellAssignment::lab("ERP Lab", "ERP Lab", "A, B"))
            .unwrap();

        let json = serde_json::to_value(TimetableView::new(&grid)).unwrap();
        let document: TimetableDocument = serde_json::from_value(json).unwrap();
        assert_eq!(document.into_grid(TeacherMatch::PerTeacher).unwrap(), grid);
    }

    #[test]
    fn test_document_rejects_break_session() {
        let mut row = serde_json::json!([null, null, null, null, null, null, null, null]);
        row[4] = serde_json::json!({"subject": "X", "name": "X", "teacher": "T", "type": "core"});
        let document: TimetableDocument = serde_json::from_value(serde_json::json!({"main": {"Friday": row}})).unwrap();
        assert!(matches!(
            document.into_grid(TeacherMatch::Exact),
            Err(crate::error::TimetableError::BreakSlot(4))
        ));
    }
}
