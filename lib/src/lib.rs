// BEGIN - Embark standard lints v0.4
// do not change or add/remove here, but one can add exceptions after this section
// for more info see: <https://github.com/EmbarkStudios/rust-ecosystem/issues/59>
#![deny(unsafe_code)]
#![warn(
    clippy::all,
    clippy::await_holding_lock,
    clippy::char_lit_as_u8,
    clippy::checked_conversions,
    clippy::dbg_macro,
    clippy::debug_assert_with_mut_call,
    clippy::doc_markdown,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::exit,
    clippy::expl_impl_clone_on_copy,
    clippy::explicit_deref_methods,
    clippy::explicit_into_iter_loop,
    clippy::fallible_impl_from,
    clippy::filter_map_next,
    clippy::float_cmp_const,
    clippy::fn_params_excessive_bools,
    clippy::if_let_mutex,
    clippy::implicit_clone,
    clippy::imprecise_flops,
    clippy::inefficient_to_string,
    clippy::invalid_upcast_comparisons,
    clippy::large_types_passed_by_value,
    clippy::let_unit_value,
    clippy::linkedlist,
    clippy::lossy_float_literal,
    clippy::macro_use_imports,
    clippy::manual_ok_or,
    clippy::map_err_ignore,
    clippy::map_flatten,
    clippy::map_unwrap_or,
    clippy::match_on_vec_items,
    clippy::match_same_arms,
    clippy::match_wildcard_for_single_variants,
    clippy::mem_forget,
    clippy::mismatched_target_os,
    clippy::mut_mut,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::option_option,
    clippy::path_buf_push_overwrite,
    clippy::ptr_as_ptr,
    clippy::ref_option_ref,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_functions_in_if_condition,
    clippy::semicolon_if_nothing_returned,
    clippy::string_add_assign,
    clippy::string_add,
    clippy::string_lit_as_bytes,
    clippy::string_to_string,
    clippy::todo,
    clippy::trait_duplication_in_bounds,
    clippy::unimplemented,
    clippy::unnested_or_patterns,
    clippy::unused_self,
    clippy::useless_transmute,
    clippy::verbose_file_reads,
    clippy::zero_sized_map_values,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms
)]
// END - Embark standard lints v0.4

//! `solid-synthesis` grows a solid (3D) texture out of a flat example image.
//!
//! Every voxel of a cubic volume is repeatedly replaced by the average of the
//! exemplar colors whose neighborhoods best match the voxel's three
//! axis-aligned cross-sections. Starting from noise, a few passes are enough
//! for every slice through the volume to look like the exemplar.
//!
//! First, you build a `Session` via a `SessionBuilder`, which follows the builder pattern. Calling
//! `build` on the `SessionBuilder` loads the exemplar, checks the parameters for errors, and
//! indexes every neighborhood of the exemplar.
//!
//! `Session` has a `run()` method that performs the configured number of passes over the volume,
//! which is returned as a `GeneratedVolume`.
//!
//! You can save the volume as a `.vol` file, stream it, or inspect its voxels and the energy of
//! each pass from `GeneratedVolume`.
//!
//! ## Usage
//! Session follows a "builder pattern" for defining parameters, meaning you chain functions
//! together.
//!
//! ```no_run
//! // Create a new session with default parameters
//! let session = solid_synthesis::Session::builder()
//!     // Set some parameters
//!     .seed(10)
//!     .volume_size(32)
//!     .iterations(3)
//!     // Specify the exemplar
//!     .exemplar(&"imgs/wood.png")
//!     // Build the session
//!     .build().expect("failed to build session");
//!
//! // Synthesize a new volume
//! let generated = session.run(None).expect("failed to synthesize volume");
//!
//! // Save the volume to disk
//! generated.save("wood.vol").expect("failed to save generated volume");
//! ```
mod color;
mod errors;
mod exemplar;
mod matcher;
mod neighborhood;
mod synthesis;
use synthesis::*;
mod utils;
pub mod session;
pub mod vol_file;
mod volume;

pub use image;
use std::path::Path;

pub use color::Color;
pub use errors::Error;
pub use exemplar::{Exemplar, ExemplarIndex};
pub use matcher::{Match, Matcher};
pub use neighborhood::{Grid, GridId, Neighborhood, Plane, Point3, Window};
pub use session::{Session, SessionBuilder};
pub use synthesis::{CancelToken, GeneratorProgress, ProgressStat, ProgressUpdate, Termination};
pub use utils::{load_dynamic_image, load_exemplar, ImageSource};
pub use vol_file::{HeaderPolicy, VolumeFile, VolumeHeader};
pub use volume::Volume;

/// Simple dimensions struct
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dims {
    pub width: u32,
    pub height: u32,
}

impl Dims {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

struct Parameters {
    volume_size: u32,
    window_size: u32,
    iterations: u32,
    seed: u64,
    max_thread_count: Option<usize>,
    texture_name: String,
    wrap: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            volume_size: 64,
            window_size: 3,
            iterations: 2,
            seed: 0,
            max_thread_count: None,
            texture_name: "texture".to_owned(),
            wrap: true,
        }
    }
}

impl Parameters {
    fn to_synthesis_params(&self) -> SynthesisParams {
        SynthesisParams {
            volume_size: self.volume_size,
            iterations: self.iterations,
            seed: self.seed,
            max_thread_count: self.max_thread_count.unwrap_or_else(num_cpus::get),
        }
    }
}

/// A volume generated by a `Session::run()`
pub struct GeneratedVolume {
    volume: Volume,
    energies: Vec<u64>,
    termination: Termination,
    texture_name: String,
    wrap: bool,
}

impl GeneratedVolume {
    /// The energy of every finished pass, in order. Lower means the volume's
    /// cross-sections matched the exemplar more closely, though it isn't
    /// guaranteed to decrease from pass to pass.
    pub fn energies(&self) -> &[u64] {
        &self.energies
    }

    /// Whether every pass ran or the synthesis was cancelled
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// The `.vol` header the volume is saved with
    pub fn header(&self) -> Result<VolumeHeader, Error> {
        VolumeHeader::new(&self.texture_name, self.wrap, self.volume.size())
    }

    /// Saves the generated volume to the specified path as a `.vol` file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        VolumeFile::from_volume(&self.texture_name, self.wrap, &self.volume)?.save(path)
    }

    /// Writes the generated volume as a `.vol` file to the specified stream,
    /// returning the number of bytes written
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> Result<usize, Error> {
        VolumeFile::from_volume(&self.texture_name, self.wrap, &self.volume)?.write(writer)
    }

    /// Returns the generated volume
    pub fn into_volume(self) -> Volume {
        self.volume
    }
}

impl AsRef<Volume> for GeneratedVolume {
    fn as_ref(&self) -> &Volume {
        &self.volume
    }
}
