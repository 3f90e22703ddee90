//! Small 3D math kernel: [`Vector3`], [`Quaternion`] and [`Matrix4`].
//!
//! Everything here is pure and allocation-free. Matrices are stored row-major in
//! column-vector convention and are transposed only when converted for upload
//! ([`Matrix4::to_gpu_array`]).

mod matrix4;
mod quaternion;
mod vector3;

pub use matrix4::Matrix4;
pub use quaternion::Quaternion;
pub use vector3::Vector3;
