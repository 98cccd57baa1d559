//! # busforge core
//!
//! The capture pipeline and the HiL generators.
//!
//! * **[`capture`]**: the capture control, guarding one scan-and-import cycle at a time.
//! * **[`scanner`]**: launching the external topology scanner.
//! * **[`importer`]**: importing a scanned descriptor and binding it to its adapter.
//! * **[`patcher`]**: normalizing descriptors against a reference hardware file.
//! * **[`descriptor`]**: the descriptor's field paths.
//! * **[`hil`]**: regenerating the shared HiL folder.
//! * **[`project`]** / **[`connector`]**: the file-backed host session and config.
//! * **[`xml`]**: the lossless element tree everything above edits.

pub mod capture;
pub mod connector;
pub mod descriptor;
pub mod hil;
pub mod importer;
pub mod patcher;
pub mod project;
pub mod scanner;
pub mod xml;
