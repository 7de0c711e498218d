pub(crate) mod academic_years;
pub(crate) mod allocations;
pub(crate) mod assignments;
pub(crate) mod classes;
pub(crate) mod departments;
pub(crate) mod health;
pub(crate) mod institutes;
pub(crate) mod semesters;
pub(crate) mod subjects;
pub(crate) mod submissions;
pub(crate) mod users;
pub(crate) mod viva;
