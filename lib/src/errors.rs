use std::fmt;

#[derive(Debug)]
pub struct InvalidRange {
    pub(crate) min: f32,
    pub(crate) max: f32,
    pub(crate) value: f32,
    pub(crate) name: &'static str,
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter '{}' - value '{}' is outside the range of {}-{}",
            self.name, self.value, self.min, self.max
        )
    }
}

#[derive(Debug)]
pub struct SizeMismatch {
    pub(crate) expected: usize,
    pub(crate) actual: usize,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} values for the given dimensions, but {} were provided",
            self.expected, self.actual
        )
    }
}

#[derive(Debug)]
pub enum Error {
    /// An error in the image library occurred, eg failed to load the exemplar
    Image(image::ImageError),
    /// An input parameter had an invalid range specified
    InvalidRange(InvalidRange),
    /// Neighborhood windows must have an odd, non-zero edge length so that
    /// they have a center
    InvalidWindowSize(u32),
    /// The exemplar has a zero width or height
    EmptyExemplar,
    /// No exemplar was added to the session
    NoExemplar,
    /// A pixel buffer doesn't hold as many pixels as its dimensions require
    SizeMismatch(SizeMismatch),
    /// Volumes can only be replaced by volumes of the same edge length,
    /// (expected, actual)
    VolumeSizeMismatch(u32, u32),
    /// The texture name can't be stored in a volume header
    InvalidTextureName(String),
    /// A neighborhood was read before all of its slots were filled,
    /// (filled, capacity)
    IncompleteNeighborhood(usize, usize),
    /// A neighborhood was resolved against a grid other than the one it was
    /// extracted from
    GridMismatch,
    /// A volume file header failed validation
    InvalidVolumeHeader(String),
    /// Io is notoriously error free with no problems, but we cover it just in case!
    Io(std::io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(ie) => write!(f, "{}", ie),
            Self::InvalidRange(ir) => write!(f, "{}", ir),
            Self::InvalidWindowSize(size) => write!(
                f,
                "window size must be odd and at least 1, but {} was given",
                size
            ),
            Self::EmptyExemplar => write!(f, "the exemplar must be at least 1x1 pixels"),
            Self::NoExemplar => write!(f, "an exemplar is required to synthesize a volume"),
            Self::SizeMismatch(sm) => write!(f, "{}", sm),
            Self::VolumeSizeMismatch(expected, actual) => write!(
                f,
                "a volume of size {} can't be replaced by a volume of size {}",
                expected, actual
            ),
            Self::InvalidTextureName(name) => write!(
                f,
                "the texture name '{}' must be at most 255 bytes and not contain NUL",
                name
            ),
            Self::IncompleteNeighborhood(filled, capacity) => write!(
                f,
                "neighborhood was read with only {} of {} slots filled",
                filled, capacity
            ),
            Self::GridMismatch => write!(
                f,
                "neighborhood was resolved against a grid it wasn't extracted from"
            ),
            Self::InvalidVolumeHeader(reason) => write!(f, "bad volume header: {}", reason),
            Self::Io(io) => write!(f, "{}", io),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(ie: image::ImageError) -> Self {
        Self::Image(ie)
    }
}

impl From<std::io::Error> for Error {
    fn from(io: std::io::Error) -> Self {
        Self::Io(io)
    }
}
