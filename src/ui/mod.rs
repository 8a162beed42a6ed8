pub mod panels;
pub mod plot;
pub mod student_form;
pub mod summary;
pub mod table;
