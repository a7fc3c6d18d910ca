pub mod descriptor_tests;
pub mod sort_tests;
pub mod stability_tests;
