pub mod campus_date_time;
