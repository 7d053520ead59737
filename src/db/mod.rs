pub mod trip_session;
