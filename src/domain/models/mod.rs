pub mod appointment;
pub mod business;
pub mod employee;
pub mod service;
pub mod user;
pub mod work_schedule;
