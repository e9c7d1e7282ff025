use super::Point;

/// An axis-aligned bounding box, used to restrict ray-sweep and polyline
/// attribution work to the cells a region's geometry can actually reach.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for BoundingBox {
    fn default() -> BoundingBox {
        BoundingBox {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl BoundingBox {
    pub fn from_points(points: &[Point]) -> BoundingBox {
        let mut bb = BoundingBox::default();
        for p in points {
            bb.expand_to_point(p);
        }
        bb
    }

    pub fn expand_to_point(&mut self, p: &Point) {
        if p.x < self.min_x {
            self.min_x = p.x;
        }
        if p.x > self.max_x {
            self.max_x = p.x;
        }
        if p.y < self.min_y {
            self.min_y = p.y;
        }
        if p.y > self.max_y {
            self.max_y = p.y;
        }
    }

    pub fn expand_to(&mut self, other: BoundingBox) {
        if other.min_x < self.min_x {
            self.min_x = other.min_x;
        }
        if other.max_x > self.max_x {
            self.max_x = other.max_x;
        }
        if other.min_y < self.min_y {
            self.min_y = other.min_y;
        }
        if other.max_y > self.max_y {
            self.max_y = other.max_y;
        }
    }

    pub fn straddles_y(&self, y: f64) -> bool {
        self.min_y <= y && y <= self.max_y
    }

    pub fn overlaps(&self, other: BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let pts = [Point::new(1.0, 2.0), Point::new(-1.0, 5.0), Point::new(3.0, -4.0)];
        let bb = BoundingBox::from_points(&pts);
        assert_eq!(bb.min_x, -1.0);
        assert_eq!(bb.max_x, 3.0);
        assert_eq!(bb.min_y, -4.0);
        assert_eq!(bb.max_y, 5.0);
    }

    #[test]
    fn test_straddles_y() {
        let bb = BoundingBox::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 10.0)]);
        assert!(bb.straddles_y(5.0));
        assert!(!bb.straddles_y(10.5));
    }
}
