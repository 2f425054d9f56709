pub mod algorithm;
pub mod app;
pub mod generators;
pub mod maze;
pub mod runner;
pub mod solvers;
pub mod topology;
