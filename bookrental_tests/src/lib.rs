#[cfg(all(test, feature = "system_tests"))]
mod system_tests;

#[cfg(all(test, feature = "load_tests"))]
mod load_test;
