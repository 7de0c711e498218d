use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::models::{AcademicYear, Class, Department, Institute, Semester};
use crate::repositories;
use crate::repositories::allocations::AllocationRow;

/// A row that hangs under exactly one parent level.
pub(crate) trait HierarchyNode {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

impl HierarchyNode for Department {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.institute_id)
    }
}

/// Institution-wide years have no department and so are nobody's child.
impl HierarchyNode for AcademicYear {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.department_id.as_deref()
    }
}

impl HierarchyNode for Semester {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.academic_year_id)
    }
}

impl HierarchyNode for Class {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.semester_id)
    }
}

/// Children whose parent key equals `parent_id`. Nothing is selectable until
/// a parent is.
pub(crate) fn children_of<'a, T: HierarchyNode>(
    parent_id: Option<&str>,
    children: &'a [T],
) -> Vec<&'a T> {
    let Some(parent_id) = parent_id.filter(|id| !id.is_empty()) else {
        return Vec::new();
    };

    children.iter().filter(|child| child.parent_id() == Some(parent_id)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Level {
    Institute,
    Department,
    AcademicYear,
    Semester,
    Class,
}

impl Level {
    pub(crate) const ALL: [Level; 5] =
        [Level::Institute, Level::Department, Level::AcademicYear, Level::Semester, Level::Class];

    fn descendants(self) -> impl Iterator<Item = Level> {
        Self::ALL.into_iter().filter(move |level| *level > self)
    }
}

/// The five cascading selections. Every setter goes through [`select`], which
/// clears all levels below a changed one.
///
/// [`select`]: CascadeSelection::select
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CascadeSelection {
    #[serde(default)]
    pub(crate) institute_id: Option<String>,
    #[serde(default)]
    pub(crate) department_id: Option<String>,
    #[serde(default, alias = "year_id")]
    pub(crate) academic_year_id: Option<String>,
    #[serde(default)]
    pub(crate) semester_id: Option<String>,
    #[serde(default)]
    pub(crate) class_id: Option<String>,
}

impl CascadeSelection {
    pub(crate) fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Institute => self.institute_id.as_deref(),
            Level::Department => self.department_id.as_deref(),
            Level::AcademicYear => self.academic_year_id.as_deref(),
            Level::Semester => self.semester_id.as_deref(),
            Level::Class => self.class_id.as_deref(),
        }
    }

    fn slot_mut(&mut self, level: Level) -> &mut Option<String> {
        match level {
            Level::Institute => &mut self.institute_id,
            Level::Department => &mut self.department_id,
            Level::AcademicYear => &mut self.academic_year_id,
            Level::Semester => &mut self.semester_id,
            Level::Class => &mut self.class_id,
        }
    }

    /// Sets one level. Returns whether the value changed; on change every
    /// descendant selection is cleared. An empty string means "nothing".
    pub(crate) fn select(&mut self, level: Level, value: Option<String>) -> bool {
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if self.get(level) == value.as_deref() {
            return false;
        }

        *self.slot_mut(level) = value;
        self.clear_below(level);
        true
    }

    /// Blank ids, as sent by empty query parameters, read as "not selected".
    pub(crate) fn drop_blank(&mut self) {
        for level in Level::ALL {
            let slot = self.slot_mut(level);
            if slot.as_deref().is_some_and(|id| id.trim().is_empty()) {
                *slot = None;
            }
        }
    }

    pub(crate) fn clear_below(&mut self, level: Level) {
        for descendant in level.descendants() {
            *self.slot_mut(descendant) = None;
        }
    }

    /// Top-down validation of a selection that did not come from [`select`].
    /// The first level whose id is unknown, or not a child of the level above,
    /// is cleared together with everything below it.
    ///
    /// [`select`]: CascadeSelection::select
    pub(crate) fn retain_valid(&mut self, master: &MasterData) {
        for level in Level::ALL {
            let Some(selected) = self.get(level) else {
                self.clear_below(level);
                return;
            };

            if !master.is_option(self, level, selected) {
                *self.slot_mut(level) = None;
                self.clear_below(level);
                return;
            }
        }
    }

    /// Deepest selected level and its id.
    pub(crate) fn deepest(&self) -> Option<(Level, &str)> {
        Level::ALL.into_iter().rev().find_map(|level| self.get(level).map(|id| (level, id)))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.deepest().is_none()
    }
}

/// Every hierarchy row, loaded flat.
#[derive(Debug, Clone, Default)]
pub(crate) struct MasterData {
    pub(crate) institutes: Vec<Institute>,
    pub(crate) departments: Vec<Department>,
    pub(crate) academic_years: Vec<AcademicYear>,
    pub(crate) semesters: Vec<Semester>,
    pub(crate) classes: Vec<Class>,
}

impl MasterData {
    pub(crate) async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            institutes: repositories::institutes::list(pool).await?,
            departments: repositories::departments::list(pool, None).await?,
            academic_years: repositories::academic_years::list(pool, None).await?,
            semesters: repositories::semesters::list(pool, None).await?,
            classes: repositories::classes::list(pool, None).await?,
        })
    }

    fn is_option(&self, selection: &CascadeSelection, level: Level, id: &str) -> bool {
        match level {
            Level::Institute => self.institutes.iter().any(|institute| institute.id == id),
            Level::Department => {
                contains(children_of(selection.get(Level::Institute), &self.departments), id)
            }
            Level::AcademicYear => {
                contains(children_of(selection.get(Level::Department), &self.academic_years), id)
            }
            Level::Semester => {
                contains(children_of(selection.get(Level::AcademicYear), &self.semesters), id)
            }
            Level::Class => {
                contains(children_of(selection.get(Level::Semester), &self.classes), id)
            }
        }
    }
}

fn contains<T: HierarchyNode>(options: Vec<&T>, id: &str) -> bool {
    options.iter().any(|option| option.id() == id)
}

/// Option lists for every level under a selection.
#[derive(Debug, Clone)]
pub(crate) struct LevelOptions<'a> {
    pub(crate) institutes: Vec<&'a Institute>,
    pub(crate) departments: Vec<&'a Department>,
    pub(crate) academic_years: Vec<&'a AcademicYear>,
    pub(crate) semesters: Vec<&'a Semester>,
    pub(crate) classes: Vec<&'a Class>,
}

pub(crate) fn options<'a>(master: &'a MasterData, selection: &CascadeSelection) -> LevelOptions<'a> {
    LevelOptions {
        institutes: master.institutes.iter().collect(),
        departments: children_of(selection.get(Level::Institute), &master.departments),
        academic_years: children_of(selection.get(Level::Department), &master.academic_years),
        semesters: children_of(selection.get(Level::AcademicYear), &master.semesters),
        classes: children_of(selection.get(Level::Semester), &master.classes),
    }
}

/// Free-text search over teacher and subject, then the deepest selected level
/// narrows the result.
pub(crate) fn filter_allocations(
    rows: Vec<AllocationRow>,
    search: Option<&str>,
    selection: &CascadeSelection,
) -> Vec<AllocationRow> {
    let needle = search.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
    let deepest = selection.deepest();

    rows.into_iter()
        .filter(|row| needle.as_deref().map_or(true, |q| matches_search(row, q)))
        .filter(|row| deepest.map_or(true, |(level, id)| allocation_level_id(row, level) == Some(id)))
        .collect()
}

fn matches_search(row: &AllocationRow, needle: &str) -> bool {
    [&row.teacher_name, &row.teacher_enrollment, &row.subject_name, &row.subject_code]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn allocation_level_id(row: &AllocationRow, level: Level) -> Option<&str> {
    match level {
        Level::Institute => row.institute_id.as_deref(),
        Level::Department => row.department_id.as_deref(),
        Level::AcademicYear => Some(&row.academic_year_id),
        Level::Semester => Some(&row.semester_id),
        Level::Class => Some(&row.class_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::SemesterType;
    use time::macros::{date, datetime};

    fn master() -> MasterData {
        let at = datetime!(2024-06-01 00:00);
        MasterData {
            institutes: vec![
                Institute { id: "i1".into(), name: "North".into(), created_at: at },
                Institute { id: "i2".into(), name: "South".into(), created_at: at },
            ],
            departments: vec![
                Department { id: "d1".into(), name: "CS".into(), institute_id: "i1".into(), created_at: at },
                Department { id: "d2".into(), name: "EE".into(), institute_id: "i1".into(), created_at: at },
                Department { id: "d3".into(), name: "Law".into(), institute_id: "i2".into(), created_at: at },
            ],
            academic_years: vec![
                year("y1", Some("d1")),
                year("y2", Some("d2")),
                year("yg", None),
            ],
            semesters: vec![semester("s1", "y1"), semester("s2", "y1"), semester("s3", "y2")],
            classes: vec![
                Class { id: "c1".into(), name: "CS-A".into(), semester_id: "s1".into(), created_at: at },
                Class { id: "c2".into(), name: "CS-B".into(), semester_id: "s2".into(), created_at: at },
            ],
        }
    }

    fn year(id: &str, department_id: Option<&str>) -> AcademicYear {
        AcademicYear {
            id: id.into(),
            name: format!("Year {id}"),
            start_date: date!(2024 - 07 - 01),
            end_date: date!(2025 - 06 - 30),
            department_id: department_id.map(Into::into),
            is_active: true,
            created_at: datetime!(2024-06-01 00:00),
        }
    }

    fn semester(id: &str, year_id: &str) -> Semester {
        Semester {
            id: id.into(),
            name: format!("Sem {id}"),
            semester_type: SemesterType::Odd,
            start_date: None,
            end_date: None,
            academic_year_id: year_id.into(),
            department_id: None,
            is_active: false,
            created_at: datetime!(2024-06-01 00:00),
        }
    }

    fn full_selection() -> CascadeSelection {
        CascadeSelection {
            institute_id: Some("i1".into()),
            department_id: Some("d1".into()),
            academic_year_id: Some("y1".into()),
            semester_id: Some("s1".into()),
            class_id: Some("c1".into()),
        }
    }

    fn ids<T: HierarchyNode>(items: Vec<&T>) -> Vec<&str> {
        items.into_iter().map(HierarchyNode::id).collect()
    }

    #[test]
    fn children_of_matches_parent_key_only() {
        let master = master();
        assert_eq!(ids(children_of(Some("i1"), &master.departments)), vec!["d1", "d2"]);
        assert_eq!(ids(children_of(Some("y1"), &master.semesters)), vec!["s1", "s2"]);
        assert!(children_of(Some("missing"), &master.classes).is_empty());
    }

    #[test]
    fn children_of_without_parent_is_empty() {
        let master = master();
        assert!(children_of(None, &master.departments).is_empty());
        assert!(children_of(Some(""), &master.departments).is_empty());
        // institution-wide years never show up under a department
        assert_eq!(ids(children_of(Some("d1"), &master.academic_years)), vec!["y1"]);
    }

    #[test]
    fn changing_a_parent_clears_every_descendant() {
        let mut selection = full_selection();
        assert!(selection.select(Level::Department, Some("d2".into())));
        assert_eq!(selection.institute_id.as_deref(), Some("i1"));
        assert_eq!(selection.department_id.as_deref(), Some("d2"));
        assert_eq!(selection.academic_year_id, None);
        assert_eq!(selection.semester_id, None);
        assert_eq!(selection.class_id, None);
    }

    #[test]
    fn blank_ids_are_dropped_without_touching_descendants() {
        let mut selection = CascadeSelection {
            institute_id: Some(String::new()),
            semester_id: Some("s1".into()),
            ..CascadeSelection::default()
        };
        selection.drop_blank();
        assert_eq!(selection.institute_id, None);
        assert_eq!(selection.semester_id.as_deref(), Some("s1"));
    }

    #[test]
    fn reselecting_the_same_value_keeps_descendants() {
        let mut selection = full_selection();
        assert!(!selection.select(Level::Institute, Some("i1".into())));
        assert_eq!(selection, full_selection());
    }

    #[test]
    fn clearing_the_root_clears_everything() {
        let mut selection = full_selection();
        assert!(selection.select(Level::Institute, Some("  ".into())));
        assert!(selection.is_empty());
    }

    #[test]
    fn retain_valid_cuts_at_first_mismatch() {
        let master = master();

        let mut selection = full_selection();
        selection.retain_valid(&master);
        assert_eq!(selection, full_selection());

        let mut selection = full_selection();
        selection.academic_year_id = Some("y2".into());
        selection.retain_valid(&master);
        assert_eq!(selection.department_id.as_deref(), Some("d1"));
        assert_eq!(selection.academic_year_id, None);
        assert_eq!(selection.semester_id, None);
        assert_eq!(selection.class_id, None);
    }

    #[test]
    fn retain_valid_drops_orphans_below_a_gap() {
        let master = master();
        let mut selection = CascadeSelection {
            institute_id: Some("i1".into()),
            semester_id: Some("s1".into()),
            ..CascadeSelection::default()
        };
        selection.retain_valid(&master);
        assert_eq!(selection.institute_id.as_deref(), Some("i1"));
        assert_eq!(selection.semester_id, None);
    }

    #[test]
    fn options_follow_the_selection() {
        let master = master();
        let selection = CascadeSelection {
            institute_id: Some("i1".into()),
            department_id: Some("d1".into()),
            ..CascadeSelection::default()
        };
        let opts = options(&master, &selection);
        assert_eq!(opts.institutes.len(), 2);
        assert_eq!(opts.departments.len(), 2);
        assert_eq!(ids(opts.academic_years), vec!["y1"]);
        assert!(opts.semesters.is_empty());
        assert!(opts.classes.is_empty());
    }

    fn allocation(id: &str, teacher: &str, code: &str, class_id: &str, semester_id: &str) -> AllocationRow {
        AllocationRow {
            id: id.into(),
            teacher_id: format!("t-{teacher}"),
            teacher_name: teacher.into(),
            teacher_enrollment: format!("EMP-{teacher}"),
            subject_id: format!("sub-{code}"),
            subject_name: format!("Subject {code}"),
            subject_code: code.into(),
            class_id: class_id.into(),
            class_name: class_id.to_uppercase(),
            semester_id: semester_id.into(),
            semester_name: semester_id.to_uppercase(),
            academic_year_id: "y1".into(),
            academic_year_name: "2024-25".into(),
            department_id: Some("d1".into()),
            department_name: Some("CS".into()),
            institute_id: Some("i1".into()),
            institute_name: Some("North".into()),
            created_at: datetime!(2024-06-01 00:00),
        }
    }

    #[test]
    fn allocation_filter_uses_deepest_level() {
        let rows = vec![
            allocation("a1", "Grace", "CS101", "c1", "s1"),
            allocation("a2", "Alan", "CS102", "c2", "s2"),
        ];

        let mut selection = CascadeSelection::default();
        selection.select(Level::Institute, Some("i1".into()));
        assert_eq!(filter_allocations(rows.clone(), None, &selection).len(), 2);

        selection.select(Level::Department, Some("d1".into()));
        selection.select(Level::AcademicYear, Some("y1".into()));
        selection.select(Level::Semester, Some("s2".into()));
        let filtered = filter_allocations(rows.clone(), None, &selection);
        assert_eq!(filtered.iter().map(|row| row.id.as_str()).collect::<Vec<_>>(), vec!["a2"]);

        selection.select(Level::Class, Some("c1".into()));
        // class wins over a semester it does not belong to
        let filtered = filter_allocations(rows, None, &selection);
        assert_eq!(filtered.iter().map(|row| row.id.as_str()).collect::<Vec<_>>(), vec!["a1"]);
    }

    #[test]
    fn allocation_search_is_trimmed_and_case_insensitive() {
        let rows = vec![
            allocation("a1", "Grace", "CS101", "c1", "s1"),
            allocation("a2", "Alan", "MA201", "c2", "s2"),
        ];
        let none = CascadeSelection::default();

        let by_name = filter_allocations(rows.clone(), Some("  grace "), &none);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "a1");

        let by_code = filter_allocations(rows.clone(), Some("ma2"), &none);
        assert_eq!(by_code[0].id, "a2");

        let by_enrollment = filter_allocations(rows.clone(), Some("emp-alan"), &none);
        assert_eq!(by_enrollment[0].id, "a2");

        assert_eq!(filter_allocations(rows, Some("   "), &none).len(), 2);
    }
}
