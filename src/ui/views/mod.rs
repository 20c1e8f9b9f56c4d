mod coming_soon;
mod courses;
mod dashboard;

pub use coming_soon::ComingSoonView;
pub use courses::CoursesView;
pub use dashboard::DashboardView;
