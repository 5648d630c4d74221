pub mod correlation_localizer;
