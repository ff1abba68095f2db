use std::ops::{Add, Mul, Sub};

/// チームID
pub type TeamId = u32;

/// エージェントの一意識別子（アリーナ内のスロット番号）
pub type AgentId = usize;

/// 3次元位置を表す構造体
///
/// Y軸を上方向とし、XZ平面を地面として扱います。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position3D {
    pub x: f64,
    pub y: f64, // 高さ
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 原点
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// XZ平面での2次元距離を計算
    pub fn distance_xz(&self, other: &Position3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance_3d(&self, other: &Position3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 自身から`other`への方位角（度、+Zを0度とし時計回りを正）
    pub fn bearing_to(&self, other: &Position3D) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        math_utils::rad_to_deg(dx.atan2(dz))
    }
}

impl Add for Position3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Position3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Position3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// エージェントのローカル座標系での速度（横方向x、前方z）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalVelocity {
    pub x: f64,
    pub z: f64,
}

/// アリーナの矩形境界（XZ平面）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl ArenaBounds {
    /// 位置が境界内かどうかを判定
    pub fn contains(&self, position: &Position3D) -> bool {
        position.x >= self.x_min && position.x <= self.x_max &&
        position.z >= self.z_min && position.z <= self.z_max
    }

    /// 位置が境界線上（壁に接している）かどうか
    pub fn is_on_edge(&self, position: &Position3D) -> bool {
        position.x <= self.x_min || position.x >= self.x_max ||
        position.z <= self.z_min || position.z >= self.z_max
    }

    /// 境界内にクランプした位置を返す
    pub fn clamp(&self, position: Position3D) -> Position3D {
        Position3D::new(
            position.x.clamp(self.x_min, self.x_max),
            position.y,
            position.z.clamp(self.z_min, self.z_max),
        )
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }

    /// 角度を-180度〜180度の範囲に正規化
    pub fn normalize_angle(angle_deg: f64) -> f64 {
        let mut normalized = angle_deg % 360.0;
        if normalized > 180.0 {
            normalized -= 360.0;
        } else if normalized < -180.0 {
            normalized += 360.0;
        }
        normalized
    }

    /// 2つの角度の差を計算（-180度〜180度の範囲）
    pub fn angle_difference(angle1_deg: f64, angle2_deg: f64) -> f64 {
        normalize_angle(angle2_deg - angle1_deg)
    }
}
