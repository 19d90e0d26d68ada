mod coupling_manager_tests;
mod fixtures;
