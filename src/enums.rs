#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Weighted combination of the eight surrounding voxels.
    #[default]
    Trilinear,
    /// Value of the closest voxel.
    Nearest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlotType {
    Line,
    #[default]
    Scatter,
    Bar,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerStyle {
    #[default]
    None,
    Circle,
    Square,
    Cross,
}
