//! One opened FITS file: the mapped handle and its HDU catalog.

use crate::catalog::HduCatalog;
use crate::error::Result;
use crate::fits::{FitsFile, Header};
use crate::image::ImagePlane;
use crate::table::{PageRequest, PageResult, TableWindow};
use crate::wcs::Resolver;
use std::path::Path;

/// An open file and everything read from its headers.
///
/// The mapping is released by [`Session::close`] or on drop.
#[derive(Debug)]
pub struct Session {
    file: FitsFile,
    catalog: HduCatalog,
}

impl Session {
    /// Open `path` and scan its HDUs.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = FitsFile::open(path)?;
        let catalog = HduCatalog::scan(&file)?;
        Ok(Self { file, catalog })
    }

    /// Path of the opened file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// HDU catalog.
    pub fn catalog(&self) -> &HduCatalog {
        &self.catalog
    }

    /// Header of HDU `index`.
    pub fn header(&self, index: usize) -> Result<&Header> {
        self.catalog.header(index)
    }

    /// Read one table page.
    pub fn get_page(&self, request: &PageRequest) -> Result<PageResult> {
        TableWindow::new(&self.file, &self.catalog).get_page(request)
    }

    /// Decode the first plane of an image HDU.
    pub fn load_image(&self, hdu: usize) -> Result<ImagePlane> {
        ImagePlane::load(&self.file, &self.catalog, hdu)
    }

    /// Astrometric resolver for HDU `hdu`.
    pub fn resolver(&self, hdu: usize) -> Result<Resolver> {
        Ok(Resolver::from_header(self.catalog.header(hdu)?))
    }

    /// Release the file mapping. Later reads fail with `FileClosed`.
    pub fn close(&mut self) {
        self.file.close();
    }

    /// Returns `true` until [`Session::close`] is called.
    pub fn is_open(&self) -> bool {
        self.file.is_open()
    }
}
