//! TapeLink: one tape-library-to-partition attachment.

super::resource_wrapper!(
    /// A tape link between a [`super::tape_library::TapeLibrary`] and a partition.
    TapeLink
);
