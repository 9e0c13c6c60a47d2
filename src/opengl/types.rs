use std::ops::Mul;

use glcore::GLCoreError;

pub type GlResult<T> = Result<T, GLCoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }
}

impl Mul for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x * rhs.x, self.y * rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Vec4 {
        Vec4 { x, y, z, w }
    }

    /// `hue` in turns, wrapping
    pub fn from_hue(hue: f32) -> Vec4 {
        let h = hue.rem_euclid(1.0) * 6.0;
        let x = 1.0 - (h % 2.0 - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        Vec4::new(r, g, b, 1.0)
    }
}

/// Column major 4x4 matrix, laid out the way `glUniformMatrix4fv` expects without transposing
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Mat4([f32; 16]);

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    fn at(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    /// Right handed, depth mapped to `[-1, 1]`
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y / 2.0).tan();
        let depth = near - far;
        Mat4([
            f / aspect, 0.0, 0.0, 0.0, //
            0.0, f, 0.0, 0.0, //
            0.0, 0.0, (far + near) / depth, -1.0, //
            0.0, 0.0, 2.0 * far * near / depth, 0.0,
        ])
    }

    pub fn translation(offset: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[12] = offset.x;
        m.0[13] = offset.y;
        m.0[14] = offset.z;
        m
    }

    pub fn rotation_x(angle: f32) -> Mat4 {
        let (s, c) = angle.sin_cos();
        Mat4([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn rotation_y(angle: f32) -> Mat4 {
        let (s, c) = angle.sin_cos();
        Mat4([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    #[cfg(test)]
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let row = |r: usize| {
            self.at(r, 0) * v.x + self.at(r, 1) * v.y + self.at(r, 2) * v.z + self.at(r, 3) * v.w
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| self.at(row, k) * rhs.at(k, col)).sum();
            }
        }
        Mat4(out)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct TexturedVertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl TexturedVertex {
    pub const fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> TexturedVertex {
        TexturedVertex {
            position: Vec3 { x, y, z },
            uv: Vec2 { x: u, y: v },
        }
    }
}

pub trait AsFloatArray {
    const FLOATS_PER_ELEMENT: usize;
    type Backend;

    fn as_contiguous_block(&self) -> Option<&[f32]>;
}

macro_rules! make_contiguous {
    ($collection:ident, $singular:ty, $per_elem:expr) => {
        #[repr(transparent)]
        pub struct $collection<'a>(&'a [$singular]);

        impl<'a> $collection<'a> {
            pub fn new(verts: &'a [$singular]) -> $collection<'a> {
                $collection(verts)
            }
        }

        impl<'a> AsFloatArray for $collection<'a> {
            const FLOATS_PER_ELEMENT: usize = $per_elem;
            type Backend = $singular;

            fn as_contiguous_block(&self) -> Option<&[f32]> {
                if self.0.is_empty() {
                    return None;
                }
                // Every element is #[repr(C)] and made of f32 only
                Some(unsafe {
                    std::slice::from_raw_parts(
                        self.0.as_ptr() as *const f32,
                        self.0.len() * Self::FLOATS_PER_ELEMENT,
                    )
                })
            }
        }
    };
}

make_contiguous!(Vec2Array, Vec2, 2);
make_contiguous!(TexturedVertexArray, TexturedVertex, 5);

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn close(a: Vec4, b: Vec4) -> bool {
        [a.x - b.x, a.y - b.y, a.z - b.z, a.w - b.w]
            .iter()
            .all(|d| d.abs() < 1e-5)
    }

    #[test]
    fn identity_is_neutral() {
        let m = Mat4::rotation_x(0.3) * Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY * m, m);
        assert_eq!(m * Mat4::IDENTITY, m);
    }

    #[test]
    fn rotations_follow_right_hand_rule() {
        let up = Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!(close(
            Mat4::rotation_x(FRAC_PI_2).transform(up),
            Vec4::new(0.0, 0.0, 1.0, 1.0)
        ));

        let forward = Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert!(close(
            Mat4::rotation_y(FRAC_PI_2).transform(forward),
            Vec4::new(1.0, 0.0, 0.0, 1.0)
        ));
    }

    #[test]
    fn products_apply_right_to_left() {
        let m = Mat4::translation(Vec3::new(0.0, 0.0, -4.0)) * Mat4::rotation_y(FRAC_PI_2);
        let p = m.transform(Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert!(close(p, Vec4::new(1.0, 0.0, -4.0, 1.0)));
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let m = Mat4::perspective(FRAC_PI_2, 1.0, 0.1, 100.0);

        let near = m.transform(Vec4::new(0.0, 0.0, -0.1, 1.0));
        assert!((near.z / near.w + 1.0).abs() < 1e-4);

        let far = m.transform(Vec4::new(0.0, 0.0, -100.0, 1.0));
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn hue_cycles_through_primaries() {
        assert_eq!(Vec4::from_hue(0.0), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert!(close(Vec4::from_hue(1.0 / 3.0), Vec4::new(0.0, 1.0, 0.0, 1.0)));
        assert!(close(Vec4::from_hue(2.0 / 3.0), Vec4::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(Vec4::from_hue(1.0), Vec4::from_hue(0.0));
    }

    #[test]
    fn vertex_arrays_flatten() {
        let verts = [
            TexturedVertex::new(1.0, 2.0, 3.0, 0.0, 1.0),
            TexturedVertex::new(4.0, 5.0, 6.0, 1.0, 0.0),
        ];
        let array = TexturedVertexArray::new(&verts);
        assert_eq!(
            array.as_contiguous_block(),
            Some(&[1.0, 2.0, 3.0, 0.0, 1.0, 4.0, 5.0, 6.0, 1.0, 0.0][..])
        );
        assert!(Vec2Array::new(&[]).as_contiguous_block().is_none());
    }
}
