// Pure training and gamification calculations, free of I/O

pub mod autoregulation;
pub mod duel;
pub mod fatigue;
pub mod gamification;
pub mod habits;
pub mod one_rm;
pub mod progression;
pub mod rpe;
