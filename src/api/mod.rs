// API routes and handlers

pub mod analytics;
pub mod auth;
pub mod duels;
pub mod exercises;
pub mod friends;
pub mod gamification;
pub mod goals;
pub mod guilds;
pub mod health;
pub mod leaderboards;
pub mod measurements;
pub mod routes;
pub mod tools;
pub mod users;
pub mod workouts;
