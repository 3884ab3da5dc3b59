use crate::*;

/// Solid texture synthesis session.
///
/// Calling `run()` will synthesize a new volume and return it, consuming the
/// session in the process. You can provide a `GeneratorProgress`
/// implementation to periodically get updates with the current volume, the
/// number of voxels resolved, and the energy of every finished pass.
///
/// # Example
/// ```no_run
/// let session = solid_synthesis::Session::builder()
///     .seed(10)
///     .volume_size(32)
///     .exemplar(&"imgs/wood.png")
///     .build().expect("failed to build session");
///
/// let generated = session.run(None).expect("failed to synthesize");
/// generated.save("wood.vol").expect("failed to save volume");
/// ```
pub struct Session {
    index: ExemplarIndex,
    params: Parameters,
    cancel: Option<CancelToken>,
}

impl Session {
    /// Creates a new session with default parameters.
    pub fn builder<'a>() -> SessionBuilder<'a> {
        SessionBuilder::default()
    }

    /// The exemplar neighborhoods the session matches against
    pub fn index(&self) -> &ExemplarIndex {
        &self.index
    }

    /// Runs every pass and outputs the synthesized volume.
    pub fn run(
        self,
        progress: Option<Box<dyn GeneratorProgress>>,
    ) -> Result<GeneratedVolume, Error> {
        let params = self.params.to_synthesis_params();
        let synthesizer = Synthesizer::new(&self.index, &params)?;
        let outcome = synthesizer.resolve(&params, progress, self.cancel.as_ref())?;

        Ok(GeneratedVolume {
            volume: outcome.volume,
            energies: outcome.energies,
            termination: outcome.termination,
            texture_name: self.params.texture_name,
            wrap: self.params.wrap,
        })
    }
}

/// Builds a session by setting parameters and adding the exemplar, calling
/// `build` will check all of the provided inputs to verify that synthesis
/// can run
#[derive(Default)]
pub struct SessionBuilder<'a> {
    exemplar: Option<ImageSource<'a>>,
    params: Parameters,
    cancel: Option<CancelToken>,
}

impl<'a> SessionBuilder<'a> {
    /// Creates a new `SessionBuilder`, can also be created via
    /// `Session::builder()`
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image whose neighborhoods the volume will be made of.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let session = solid_synthesis::Session::builder()
    ///     .exemplar(&"imgs/wood.ppm")
    ///     .build().expect("failed to build session");
    /// ```
    pub fn exemplar<E: Into<ImageSource<'a>>>(mut self, exemplar: E) -> Self {
        self.exemplar = Some(exemplar.into());
        self
    }

    /// Edge length of the generated cube.
    ///
    /// Default: 64
    pub fn volume_size(mut self, size: u32) -> Self {
        self.params.volume_size = size;
        self
    }

    /// Edge length of the square neighborhoods compared between the volume
    /// and the exemplar. Must be odd.
    ///
    /// Larger windows capture bigger structures, the cost of a pass grows
    /// with the square of the window.
    ///
    /// Default: 3
    pub fn window_size(mut self, size: u32) -> Self {
        self.params.window_size = size;
        self
    }

    /// Number of passes over the whole volume.
    ///
    /// Default: 2
    pub fn iterations(mut self, count: u32) -> Self {
        self.params.iterations = count;
        self
    }

    /// Changes the seed of the initial noise.
    ///
    /// The output only depends on the seed and the inputs, never on the
    /// number of threads.
    pub fn seed(mut self, value: u64) -> Self {
        self.params.seed = value;
        self
    }

    /// Controls the maximum number of threads that will be spawned at any one
    /// time in parallel.
    ///
    /// Default: The number of logical cores on this system.
    pub fn max_thread_count(mut self, count: usize) -> Self {
        self.params.max_thread_count = Some(count);
        self
    }

    /// The name stored in the header of a saved volume.
    ///
    /// Default: "texture"
    pub fn texture_name<S: Into<String>>(mut self, name: S) -> Self {
        self.params.texture_name = name.into();
        self
    }

    /// Whether a saved volume is flagged as tiling. The synthesis itself
    /// always wraps around.
    ///
    /// Default: true
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.params.wrap = wrap;
        self
    }

    /// Allows the synthesis to be stopped between passes by cancelling the
    /// token from another thread or from a progress callback.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Creates a `Session`, or returns an error if invalid parameters or an
    /// invalid exemplar were specified.
    pub fn build(self) -> Result<Session, Error> {
        self.check_parameters_validity()?;

        let window = Window::new(self.params.window_size)?;
        let exemplar = load_exemplar(self.exemplar.ok_or(Error::NoExemplar)?)?;
        let index = ExemplarIndex::build(exemplar, window);

        Ok(Session {
            index,
            params: self.params,
            cancel: self.cancel,
        })
    }

    fn check_parameters_validity(&self) -> Result<(), Error> {
        if self.exemplar.is_none() {
            return Err(Error::NoExemplar);
        }

        volume::check_size(self.params.volume_size)?;

        Window::new(self.params.window_size)?;

        if self.params.iterations == 0 {
            return Err(Error::InvalidRange(errors::InvalidRange {
                min: 1.0,
                max: 1024.0,
                value: self.params.iterations as f32,
                name: "iterations",
            }));
        }

        if let Some(max_count) = self.params.max_thread_count {
            if max_count == 0 {
                return Err(Error::InvalidRange(errors::InvalidRange {
                    min: 1.0,
                    max: 1024.0,
                    value: max_count as f32,
                    name: "max-thread-count",
                }));
            }
        }

        if self.params.texture_name.len() >= 256 || self.params.texture_name.contains('\0') {
            return Err(Error::InvalidTextureName(self.params.texture_name.clone()));
        }

        Ok(())
    }
}
