use glam::Vec3;

/// The three medical cutting planes. Each view owns exactly one for its
/// whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Axial,
        Orientation::Coronal,
        Orientation::Sagittal,
    ];

    /// Volume axis held fixed by this orientation, as a unit vector in
    /// (x = column, y = row, z = slice) volume space.
    pub fn normal_axis(self) -> Vec3 {
        match self {
            Orientation::Axial => Vec3::Z,
            Orientation::Coronal => Vec3::Y,
            Orientation::Sagittal => Vec3::X,
        }
    }

    /// Slice index this orientation reads from a `(width, height, depth)`
    /// triple.
    pub fn slice_count(self, dims: (usize, usize, usize)) -> usize {
        let (width, height, depth) = dims;
        match self {
            Orientation::Axial => depth,
            Orientation::Coronal => height,
            Orientation::Sagittal => width,
        }
    }

    /// Position edited by dragging this view's horizontal crosshair line.
    pub fn horizontal_target(self) -> Orientation {
        match self {
            Orientation::Axial => Orientation::Coronal,
            Orientation::Coronal | Orientation::Sagittal => Orientation::Axial,
        }
    }

    /// Position edited by dragging this view's vertical crosshair line.
    pub fn vertical_target(self) -> Orientation {
        match self {
            Orientation::Axial | Orientation::Coronal => Orientation::Sagittal,
            Orientation::Sagittal => Orientation::Coronal,
        }
    }

    /// Stable position in [`Orientation::ALL`].
    pub fn index(self) -> usize {
        match self {
            Orientation::Axial => 0,
            Orientation::Coronal => 1,
            Orientation::Sagittal => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Axial => "axial",
            Orientation::Coronal => "coronal",
            Orientation::Sagittal => "sagittal",
        }
    }
}

/// Reduction used when a slice is thickened into a slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlabMode {
    #[default]
    MaxIP,
    MinIP,
    AvgIP,
}

/// Screen axis of a crosshair line or handle, relative to the view it is
/// drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleAxis {
    Horizontal,
    Vertical,
}

/// How a frame is sampled on the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Processor {
    #[default]
    CPU,
    /// Rows are sampled on the rayon pool. The call still returns only once
    /// the whole frame is done.
    CPUParallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
