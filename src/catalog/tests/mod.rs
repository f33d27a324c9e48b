//! Test modules for the catalog
