/// Operation tag of a recorded command.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Clear,
    ClearRect,
    ClipRect,

    SetColor,
    SetBackground,
    SetStroke,
    SetFont,
    SetGradient,
    SetImageTexture,

    Rotate,
    Scale,
    Translate,
    Shear,
    SetTransform,

    DrawLine,
    DrawArc,
    FillArc,
    DrawRect,
    FillRect,
    DrawRoundRect,
    FillRoundRect,
    DrawPolygon,
    FillPolygon,
    DrawPolyline,
    DrawImage,
    DrawString,
}

/// Float operand count of an opcode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FloatArity {
    Fixed(usize),
    /// `4 × vertex count` (x, y, u, v); the count is the single int operand.
    PerVertex,
}

/// Operand counts every command with a given opcode carries.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Arity {
    pub floats: FloatArity,
    pub ints: usize,
    pub handles: usize,
}

impl Arity {
    const fn fixed(floats: usize, ints: usize, handles: usize) -> Self {
        Self { floats: FloatArity::Fixed(floats), ints, handles }
    }

    /// Float count for a command whose int operands are `ints`.
    pub fn float_count(&self, ints: &[i32]) -> Option<usize> {
        match self.floats {
            FloatArity::Fixed(n) => Some(n),
            FloatArity::PerVertex => ints.first().and_then(|n| usize::try_from(*n).ok()).map(|n| n * 4),
        }
    }
}

/// Floats per polygon-class vertex.
pub const VERTEX_STRIDE: usize = 4;

impl Opcode {
    /// Operand layout:
    ///
    /// | opcode                         | floats                           | ints  | handles |
    /// |--------------------------------|----------------------------------|-------|---------|
    /// | `Clear`                        | –                                | –     | –       |
    /// | `ClearRect`, `ClipRect`        | x y w h                          | –     | –       |
    /// | `SetColor`, `SetBackground`    | r g b a (premultiplied)          | –     | –       |
    /// | `SetStroke` … `SetImageTexture`| –                                | –     | 1       |
    /// | `Rotate`                       | theta                            | –     | –       |
    /// | `Scale`, `Translate`, `Shear`  | x y                              | –     | –       |
    /// | `SetTransform`                 | m00 m01 m02 m10 m11 m12          | –     | –       |
    /// | `DrawLine`                     | x1 y1 x2 y2                      | –     | –       |
    /// | `DrawArc`, `FillArc`           | x y w h start sweep (degrees)    | –     | –       |
    /// | `DrawRoundRect`, `FillRoundRect`| x y w h arc_w arc_h             | –     | –       |
    /// | polygon class                  | x y u v per vertex               | count | –       |
    /// | `DrawImage`                    | dst x y w h, src x y w h (px)    | flags | image   |
    /// | `DrawString`                   | x y                              | –     | text    |
    pub const fn arity(self) -> Arity {
        use Opcode::*;
        match self {
            Clear => Arity::fixed(0, 0, 0),
            ClearRect | ClipRect => Arity::fixed(4, 0, 0),
            SetColor | SetBackground => Arity::fixed(4, 0, 0),
            SetStroke | SetFont | SetGradient | SetImageTexture => Arity::fixed(0, 0, 1),
            Rotate => Arity::fixed(1, 0, 0),
            Scale | Translate | Shear => Arity::fixed(2, 0, 0),
            SetTransform => Arity::fixed(6, 0, 0),
            DrawLine => Arity::fixed(4, 0, 0),
            DrawArc | FillArc => Arity::fixed(6, 0, 0),
            DrawRoundRect | FillRoundRect => Arity::fixed(6, 0, 0),
            DrawRect | FillRect | DrawPolygon | FillPolygon | DrawPolyline => {
                Arity { floats: FloatArity::PerVertex, ints: 1, handles: 0 }
            }
            DrawImage => Arity::fixed(8, 1, 1),
            DrawString => Arity::fixed(2, 0, 1),
        }
    }

    /// Vertex-list opcodes whose geometry and UVs are carried inline.
    #[inline]
    pub const fn is_polygon_class(self) -> bool {
        matches!(self.arity().floats, FloatArity::PerVertex)
    }

    #[inline]
    pub const fn is_state_change(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            SetColor | SetBackground | SetStroke | SetFont | SetGradient | SetImageTexture
        )
    }
}

/// `DrawImage` flag: fill the destination with the background color first.
pub const IMAGE_FLAG_BACKGROUND: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_class_float_count_follows_vertex_count() {
        let a = Opcode::FillPolygon.arity();
        assert_eq!(a.float_count(&[5]), Some(20));
        assert_eq!(a.float_count(&[-1]), None);
        assert!(Opcode::FillRect.is_polygon_class());
        assert!(!Opcode::DrawArc.is_polygon_class());
    }

    #[test]
    fn fixed_arity() {
        assert_eq!(Opcode::SetTransform.arity().float_count(&[]), Some(6));
        assert_eq!(Opcode::DrawImage.arity().handles, 1);
        assert!(Opcode::SetGradient.is_state_change());
    }
}
